use std::f64::consts::PI;

use sdl3_binding_core::{Color, Context, DemoConfig, FPoint, FRect};

/// Source of randomness for the scene.
pub trait RandomSource {
    /// Uniform value in `[0, 1)`.
    fn next_f32(&mut self) -> f32;
    fn coin_flip(&mut self) -> bool;
}

/// Draws from SDL's own generator.
pub struct SdlRandom<'a>(pub &'a Context);

impl RandomSource for SdlRandom<'_> {
    fn next_f32(&mut self) -> f32 {
        self.0.rand_f32()
    }

    fn coin_flip(&mut self) -> bool {
        self.0.rand_below(2).map(|n| n == 0).unwrap_or(true)
    }
}

/// Points drifting down and to the right, each framed by a small rect.
#[derive(Debug)]
pub struct PointField {
    config: DemoConfig,
    width: f32,
    height: f32,
    speeds: Vec<f32>,
    points: Vec<FPoint>,
    rects: Vec<FRect>,
}

impl PointField {
    pub fn new(config: DemoConfig, width: f32, height: f32, rng: &mut impl RandomSource) -> Self {
        let mut field = Self {
            speeds: Vec::with_capacity(config.num_points),
            points: Vec::with_capacity(config.num_points),
            rects: Vec::with_capacity(config.num_points),
            config,
            width,
            height,
        };

        for _ in 0..field.config.num_points {
            let speed = field.random_speed(rng);
            let point = FPoint {
                x: rng.next_f32() * width,
                y: rng.next_f32() * height,
            };
            let rect = field.rect_around(point);
            field.speeds.push(speed);
            field.points.push(point);
            field.rects.push(rect);
        }
        field
    }

    pub fn points(&self) -> &[FPoint] {
        &self.points
    }

    pub fn rects(&self) -> &[FRect] {
        &self.rects
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// Advances every point by `elapsed` seconds. Points leaving the bounds
    /// re-enter from a random spot on the top or left edge with a new speed.
    pub fn update(&mut self, elapsed: f32, rng: &mut impl RandomSource) {
        for i in 0..self.points.len() {
            let dist = elapsed * self.speeds[i];
            let mut point = self.points[i];
            point.x += dist;
            point.y += dist;

            if point.x >= self.width || point.y >= self.height {
                point = if rng.coin_flip() {
                    FPoint {
                        x: rng.next_f32() * self.width,
                        y: 0.0,
                    }
                } else {
                    FPoint {
                        x: 0.0,
                        y: rng.next_f32() * self.height,
                    }
                };
                let speed = self.random_speed(rng);
                self.speeds[i] = speed;
            }

            let rect = self.rect_around(point);
            self.points[i] = point;
            self.rects[i] = rect;
        }
    }

    fn random_speed(&self, rng: &mut impl RandomSource) -> f32 {
        let span = self.config.max_pixels_per_sec - self.config.min_pixels_per_sec;
        self.config.min_pixels_per_sec + rng.next_f32() * span
    }

    fn rect_around(&self, point: FPoint) -> FRect {
        let half = self.config.rect_half_size;
        FRect {
            x: point.x - half,
            y: point.y - half,
            w: 2.0 * half,
            h: 2.0 * half,
        }
    }
}

/// Background color cycling smoothly through hues over time.
pub fn background(now_seconds: f64) -> Color {
    let channel = |phase: f64| (0.5 + 0.5 * (now_seconds + phase).sin()) as f32;
    Color::opaque(channel(0.0), channel(PI * 2.0 / 3.0), channel(PI * 4.0 / 3.0))
}

/// Color for the points drawn over `background`.
pub fn point_color(background: Color) -> Color {
    if background.luminance() <= 0.5 {
        Color::BLACK
    } else {
        Color::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        value: f32,
        heads: bool,
    }

    impl RandomSource for Fixed {
        fn next_f32(&mut self) -> f32 {
            self.value
        }

        fn coin_flip(&mut self) -> bool {
            self.heads
        }
    }

    fn config(num_points: usize) -> DemoConfig {
        DemoConfig {
            num_points,
            ..DemoConfig::default()
        }
    }

    #[test]
    fn spawns_points_with_rects_around_them() {
        let mut rng = Fixed {
            value: 0.5,
            heads: true,
        };
        let field = PointField::new(config(3), 100.0, 50.0, &mut rng);

        assert_eq!(field.points().len(), 3);
        assert_eq!(field.points()[0], FPoint { x: 50.0, y: 25.0 });
        assert_eq!(
            field.rects()[0],
            FRect {
                x: 47.0,
                y: 22.0,
                w: 6.0,
                h: 6.0
            }
        );
    }

    #[test]
    fn points_drift_diagonally() {
        let mut rng = Fixed {
            value: 0.0,
            heads: true,
        };
        let mut field = PointField::new(config(1), 100.0, 100.0, &mut rng);
        // speed = min speed (30 px/s) with a zero random draw
        field.update(0.5, &mut rng);

        assert_eq!(field.points()[0], FPoint { x: 15.0, y: 15.0 });
        assert_eq!(field.rects()[0].x, 12.0);
    }

    #[test]
    fn leaving_the_bounds_wraps_to_an_edge() {
        let mut rng = Fixed {
            value: 0.9,
            heads: false,
        };
        let mut field = PointField::new(config(1), 100.0, 100.0, &mut rng);
        field.update(10.0, &mut rng);

        let point = field.points()[0];
        assert_eq!(point.x, 0.0);
        assert!((point.y - 90.0).abs() < 1e-4);
    }

    #[test]
    fn point_color_contrasts_with_background() {
        assert_eq!(point_color(Color::opaque(0.1, 0.1, 0.1)), Color::BLACK);
        assert_eq!(point_color(Color::opaque(0.9, 0.9, 0.9)), Color::WHITE);

        let bg = background(0.0);
        assert!((bg.r - 0.5).abs() < 1e-6);
        assert!(bg.g > 0.5 && bg.b < 0.5);
    }
}
