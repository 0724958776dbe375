use glam::Vec3;

/// The behavior record of one light: current position plus how its range
/// and color evolve over time. Range keyframes are scales applied to the
/// base range; color keyframes are absolute.
#[derive(Debug, Clone, Default)]
pub struct LightSource {
    position: Vec3,
    base_range: f32,
    range_anim: Option<Keyframes<f32>>,
    color: Vec3,
    color_anim: Option<Keyframes<Vec3>>,
    current_range: f32,
    current_color: Vec3,
}

#[derive(Debug, Clone)]
struct Keyframes<T> {
    frames: Vec<T>,
    fps: f32,
    smooth: bool,
}

impl<T: Copy> Keyframes<T> {
    fn sample(&self, time_ms: u64, lerp: impl Fn(T, T, f32) -> T) -> T {
        let frame = (time_ms as f64) * (self.fps as f64) / 1000.0;
        let len = self.frames.len();
        let i0 = (frame as u64 % len as u64) as usize;

        if !self.smooth {
            return self.frames[i0];
        }
        let i1 = (i0 + 1) % len;
        lerp(self.frames[i0], self.frames[i1], frame.fract() as f32)
    }
}

impl LightSource {
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, p: Vec3) {
        self.position = p;
    }

    pub fn set_range(&mut self, range: f32) {
        self.base_range = range;
        self.current_range = range;
        self.range_anim = None;
    }

    pub fn set_range_anim(&mut self, scales: Vec<f32>, base: f32, fps: f32, smooth: bool) {
        if scales.is_empty() {
            self.set_range(base);
            return;
        }
        self.base_range = base;
        self.current_range = base * scales[0];
        self.range_anim = Some(Keyframes {
            frames: scales,
            fps,
            smooth,
        });
    }

    pub fn set_color(&mut self, color: Vec3) {
        self.color = color;
        self.current_color = color;
        self.color_anim = None;
    }

    pub fn set_color_anim(&mut self, colors: Vec<Vec3>, fps: f32, smooth: bool) {
        if colors.is_empty() {
            return;
        }
        self.current_color = colors[0];
        self.color_anim = Some(Keyframes {
            frames: colors,
            fps,
            smooth,
        });
    }

    /// Lights with any keyframe animation live in the dynamic pool.
    pub fn is_dynamic(&self) -> bool {
        self.range_anim.is_some() || self.color_anim.is_some()
    }

    pub fn update(&mut self, time_ms: u64) {
        if let Some(anim) = &self.range_anim {
            self.current_range = self.base_range * anim.sample(time_ms, |a, b, t| a + (b - a) * t);
        }
        if let Some(anim) = &self.color_anim {
            self.current_color = anim.sample(time_ms, Vec3::lerp);
        }
    }

    pub fn current_range(&self) -> f32 {
        self.current_range
    }

    pub fn current_color(&self) -> Vec3 {
        self.current_color
    }
}
