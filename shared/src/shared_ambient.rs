use rand::Rng;

use crate::constants::{MIN_PARTICLES, PARTICLE_AREA_PER_UNIT};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub speed: f64,
    pub base_alpha: f64,
}

impl Particle {
    fn random<R: Rng + ?Sized>(width: f64, height: f64, rng: &mut R) -> Self {
        Self {
            x: rng.gen::<f64>() * width,
            y: rng.gen::<f64>() * height,
            radius: rng.gen_range(0.6..2.2),
            speed: rng.gen_range(0.2..0.9),
            base_alpha: rng.gen_range(0.005..0.03),
        }
    }
}

/// Number of particles for a viewport and density multiplier.
pub fn particle_count(width: f64, height: f64, density: f64) -> usize {
    let scaled = (width * height / PARTICLE_AREA_PER_UNIT * density).floor();
    if scaled.is_finite() && scaled > MIN_PARTICLES as f64 {
        scaled as usize
    } else {
        MIN_PARTICLES
    }
}

/// Alpha actually painted for a particle.
pub fn particle_alpha(base_alpha: f64, multiplier: f64) -> f64 {
    (base_alpha * multiplier).clamp(0.0, 1.0)
}

/// Falling particle set covering the whole viewport. Rebuilt wholesale on
/// resize or density change; no particle survives a rebuild.
#[derive(Debug, Clone, Default)]
pub struct ParticleField {
    width: f64,
    height: f64,
    particles: Vec<Particle>,
}

impl ParticleField {
    pub fn new<R: Rng + ?Sized>(width: f64, height: f64, density: f64, rng: &mut R) -> Self {
        let mut field = Self::default();
        field.regenerate(width, height, density, rng);
        field
    }

    pub fn regenerate<R: Rng + ?Sized>(&mut self, width: f64, height: f64, density: f64, rng: &mut R) {
        let count = particle_count(width, height, density);
        let particles = (0..count)
            .map(|_| Particle::random(width, height, rng))
            .collect();
        self.width = width;
        self.height = height;
        self.particles = particles;
    }

    /// One frame of motion: fall by `speed`, drift sideways on a sine keyed to
    /// the new height and the particle index, re-enter at the top with a fresh
    /// horizontal position once past the bottom edge.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let (width, height) = (self.width, self.height);
        for (i, p) in self.particles.iter_mut().enumerate() {
            p.y += p.speed;
            p.x += (p.y * 0.01 + i as f64).sin() * 0.4;
            if p.y > height + 6.0 {
                p.y = -10.0;
                p.x = rng.gen::<f64>() * width;
            }
        }
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

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }
}

/// Visual state briefly applied to the lamp backdrop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LampEffect {
    Dim,
    Flicker,
    Spark,
}

impl LampEffect {
    pub const ALL: [LampEffect; 3] = [Self::Dim, Self::Flicker, Self::Spark];

    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Dim => "dim",
            Self::Flicker => "flicker",
            Self::Spark => "spark",
        }
    }
}

/// One tick of the lamp flicker: an optional effect with how long it stays
/// on, and the delay before the next tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LampTick {
    pub effect: Option<(LampEffect, u32)>,
    pub next_in_ms: u32,
}

impl LampTick {
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let r: f64 = rng.gen();
        let effect = Self::effect_for(r).map(|effect| {
            let hold = match effect {
                LampEffect::Dim => 300.0 + rng.gen::<f64>() * 900.0,
                LampEffect::Flicker => 80.0 + rng.gen::<f64>() * 180.0,
                LampEffect::Spark => 90.0 + rng.gen::<f64>() * 220.0,
            };
            (effect, hold as u32)
        });
        Self {
            effect,
            next_in_ms: (200.0 + rng.gen::<f64>() * 1000.0) as u32,
        }
    }

    pub fn effect_for(r: f64) -> Option<LampEffect> {
        if r < 0.06 {
            Some(LampEffect::Dim)
        } else if r < 0.34 {
            Some(LampEffect::Flicker)
        } else if r > 0.986 {
            Some(LampEffect::Spark)
        } else {
            None
        }
    }
}
