//! Crash burst particles
//!
//! A batch of particles spawned at the crash point. Each tick moves them,
//! pulls them down, drags them sideways and burns their life; the batch is
//! spent once the last particle dies.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::profile::PerformanceProfile;
use crate::render::{Color, DrawContext};

/// A single burst particle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    /// Pixels per tick
    pub vel: Vec2,
    pub life: f32, // 0-1, decreases each tick
    pub decay: f32,
    pub radius: f32,
    pub color: Color,
}

impl Particle {
    /// Advance one tick
    pub fn step(&mut self) {
        self.pos += self.vel;
        self.vel.y += BURST_GRAVITY;
        self.vel.x *= BURST_DRAG;
        self.life -= self.decay;
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.life > 0.0
    }
}

/// One crash explosion
#[derive(Debug, Clone)]
pub struct BurstSimulator {
    origin: Vec2,
    particles: Vec<Particle>,
    active: bool,
}

impl BurstSimulator {
    /// Spawn exactly `profile.particle_budget` particles at `origin`.
    ///
    /// Velocity components are uniform in [-BURST_SPEED, BURST_SPEED), decay and
    /// radius uniform in their ranges, colour uniform over `palette`.
    pub fn new<R: Rng>(
        origin: Vec2,
        profile: &PerformanceProfile,
        palette: &[Color],
        rng: &mut R,
    ) -> Self {
        let fallback = [Color::white()];
        let palette = if palette.is_empty() { &fallback[..] } else { palette };

        let particles: Vec<Particle> = (0..profile.particle_budget)
            .map(|_| Particle {
                pos: origin,
                vel: Vec2::new(
                    rng.random_range(-BURST_SPEED..BURST_SPEED),
                    rng.random_range(-BURST_SPEED..BURST_SPEED),
                ),
                life: 1.0,
                decay: rng.random_range(BURST_DECAY_MIN..BURST_DECAY_MAX),
                radius: rng.random_range(BURST_RADIUS_MIN..BURST_RADIUS_MAX),
                color: palette[rng.random_range(0..palette.len())].clone(),
            })
            .collect();

        log::debug!("Burst at ({:.1}, {:.1}): {} particles", origin.x, origin.y, particles.len());

        Self {
            origin,
            active: !particles.is_empty(),
            particles,
        }
    }

    /// Advance every particle one tick and drop the dead ones
    pub fn update(&mut self) {
        if !self.active {
            return;
        }
        for particle in self.particles.iter_mut() {
            particle.step();
        }
        self.particles.retain(Particle::is_alive);
        self.active = !self.particles.is_empty();
    }

    /// Drop every particle; the batch goes inactive immediately
    pub fn reset(&mut self) {
        self.particles.clear();
        self.active = false;
    }

    /// Fill each particle with opacity equal to its remaining life
    pub fn draw<C: DrawContext>(&self, ctx: &mut C) {
        if !self.active {
            return;
        }
        for particle in &self.particles {
            ctx.save();
            ctx.set_global_alpha(particle.life.clamp(0.0, 1.0));
            ctx.fill_circle(particle.pos, particle.radius, &particle.color);
            ctx.restore();
        }
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Sum of remaining life across the batch
    pub fn total_life(&self) -> f32 {
        self.particles.iter().map(|p| p.life).sum()
    }
}
