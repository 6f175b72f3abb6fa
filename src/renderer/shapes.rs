//! Entity outlines drawn as canvas paths

use std::f32::consts::TAU;

use super::surface::{DrawSurface, Rgba};
use crate::services::PowerupKind;
use crate::sim::{Entity, EntityKind};

/// Palette
pub mod colors {
    use super::Rgba;

    pub const SHIP: Rgba = [1.0, 1.0, 1.0, 1.0];
    pub const SHIP_FILL: Rgba = [0.0, 0.0, 0.0, 1.0];
    pub const ASTEROID: Rgba = [1.0, 1.0, 1.0, 1.0];
    pub const BULLET: Rgba = [1.0, 0.9, 0.4, 1.0];
    pub const EXHAUST: Rgba = [1.0, 0.6, 0.2, 1.0];
    pub const PILL_INVINCIBLE: Rgba = [0.3, 0.8, 1.0, 1.0];
    pub const PILL_RAPID_FIRE: Rgba = [1.0, 0.3, 0.4, 1.0];
    pub const TOKEN: Rgba = [1.0, 0.84, 0.0, 1.0];
    pub const SHIP_PICKUP: Rgba = [0.4, 1.0, 0.5, 1.0];
    /// Translucent black painted over the last frame for the trail effect
    pub const FADE: Rgba = [0.0, 0.0, 0.0, 0.4];
}

/// Ship hull, nose pointing up
const SHIP_HULL: [(f32, f32); 5] = [(0.0, -15.0), (10.0, 10.0), (5.0, 7.0), (-5.0, 7.0), (-10.0, 10.0)];

/// Draw one entity at its transform
pub fn draw_entity(surface: &mut dyn DrawSurface, entity: &Entity) {
    surface.save();
    surface.translate(entity.pos.x, entity.pos.y);
    surface.rotate(entity.rotation.to_radians());

    match &entity.kind {
        EntityKind::Ship(_) => {
            polygon(surface, &SHIP_HULL, 1.0);
            surface.set_stroke_color(colors::SHIP);
            surface.set_fill_color(colors::SHIP_FILL);
            surface.set_line_width(2.0);
            surface.fill();
            surface.stroke();
        }
        EntityKind::Asteroid(rock) => {
            let step = TAU / rock.outline.len().max(1) as f32;
            surface.begin_path();
            for (i, scale) in rock.outline.iter().enumerate() {
                let angle = i as f32 * step;
                let (x, y) = (angle.cos() * entity.radius * scale, angle.sin() * entity.radius * scale);
                if i == 0 {
                    surface.move_to(x, y);
                } else {
                    surface.line_to(x, y);
                }
            }
            surface.close_path();
            surface.set_stroke_color(colors::ASTEROID);
            surface.set_line_width(2.0);
            surface.stroke();
        }
        EntityKind::Bullet(_) => {
            disc(surface, entity.radius, colors::BULLET);
        }
        EntityKind::Particle(particle) => {
            disc(surface, entity.radius, particle.color);
        }
        EntityKind::Pill(pill) => {
            let color = match pill.powerup {
                PowerupKind::Invincible => colors::PILL_INVINCIBLE,
                PowerupKind::RapidFire => colors::PILL_RAPID_FIRE,
            };
            disc(surface, entity.radius, color);
            // Capsule seam
            surface.begin_path();
            surface.move_to(-entity.radius, 0.0);
            surface.line_to(entity.radius, 0.0);
            surface.set_stroke_color(colors::SHIP_FILL);
            surface.set_line_width(1.0);
            surface.stroke();
        }
        EntityKind::Token(_) => {
            disc(surface, entity.radius, colors::TOKEN);
            surface.set_stroke_color(colors::SHIP);
            surface.set_line_width(1.5);
            surface.stroke();
        }
        EntityKind::ShipPickup(_) => {
            polygon(surface, &SHIP_HULL, entity.radius / 15.0);
            surface.set_stroke_color(colors::SHIP_PICKUP);
            surface.set_line_width(2.0);
            surface.stroke();
        }
    }

    surface.restore();
}

fn polygon(surface: &mut dyn DrawSurface, points: &[(f32, f32)], scale: f32) {
    surface.begin_path();
    for (i, &(x, y)) in points.iter().enumerate() {
        if i == 0 {
            surface.move_to(x * scale, y * scale);
        } else {
            surface.line_to(x * scale, y * scale);
        }
    }
    surface.close_path();
}

fn disc(surface: &mut dyn DrawSurface, radius: f32, color: Rgba) {
    surface.begin_path();
    surface.arc(0.0, 0.0, radius, 0.0, TAU);
    surface.close_path();
    surface.set_fill_color(color);
    surface.fill();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{DrawCommand, RecordingSurface};
    use crate::sim::EntityId;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_draw_is_balanced_and_translated() {
        let mut surface = RecordingSurface::new();
        let ship = Entity::ship(EntityId(1), Vec2::new(30.0, 40.0));
        draw_entity(&mut surface, &ship);

        let commands = surface.commands();
        assert_eq!(commands.first(), Some(&DrawCommand::Save));
        assert_eq!(commands.get(1), Some(&DrawCommand::Translate(30.0, 40.0)));
        assert_eq!(commands.last(), Some(&DrawCommand::Restore));
        assert_eq!(surface.save_depth(), 0);
    }

    #[test]
    fn test_asteroid_outline_has_one_vertex_per_sample() {
        let mut rng = Pcg32::seed_from_u64(3);
        let rock = Entity::asteroid(EntityId(2), Vec2::ZERO, 40.0, &mut rng);
        let mut surface = RecordingSurface::new();
        draw_entity(&mut surface, &rock);

        let vertices = surface
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::MoveTo(..) | DrawCommand::LineTo(..)))
            .count();
        assert_eq!(vertices, 12);
    }
}
