use glam::Vec4;

pub mod file_ext;

pub fn int_as_color(data: i32) -> Vec4 {
    Vec4::new(
        ((data >> 16) & 0xFF) as f32 / 255.0,
        ((data >> 8) & 0xFF) as f32 / 255.0,
        (data & 0xFF) as f32 / 255.0,
        1.0,
    )
}
