use super::*;

fn apply(m: &[f32; 20], px: [u8; 4]) -> [u8; 4] {
    let mut buf = px.to_vec();
    color_matrix_rgba8_premul(&mut buf, m);
    [buf[0], buf[1], buf[2], buf[3]]
}

#[test]
fn identity_matrix_is_a_no_op() {
    assert_eq!(apply(&IDENTITY_MATRIX, [10, 100, 200, 255]), [10, 100, 200, 255]);
    assert_eq!(apply(&IDENTITY_MATRIX, [50, 25, 0, 128]), [50, 25, 0, 128]);
}

#[test]
fn brightness_scales_and_saturate_zero_is_grey() {
    assert_eq!(apply(&brightness_matrix(0.5), [200, 100, 50, 255]), [100, 50, 25, 255]);

    let grey = apply(&saturate_matrix(0.0), [255, 0, 0, 255]);
    assert_eq!(grey[0], grey[1]);
    assert_eq!(grey[1], grey[2]);
}

#[test]
fn contrast_zero_collapses_to_mid_grey() {
    let out = apply(&contrast_matrix(0.0), [0, 255, 30, 255]);
    assert_eq!(out, [128, 128, 128, 255]);
}

#[test]
fn composition_applies_first_then_second() {
    let m = compose_color_matrix(contrast_matrix(0.0), brightness_matrix(2.0));
    assert_eq!(apply(&m, [200, 10, 0, 255]), [128, 128, 128, 255]);

    let m = compose_color_matrix(brightness_matrix(0.5), contrast_matrix(0.0));
    assert_eq!(apply(&m, [200, 10, 0, 255]), [64, 64, 64, 255]);
}

#[test]
fn gaussian_kernel_sums_to_one() {
    for (r, s) in [(1, 0.5), (3, 1.0), (12, 4.0)] {
        let k = gaussian_kernel_q16(r, s).unwrap();
        assert_eq!(k.len(), (2 * r + 1) as usize);
        assert_eq!(k.iter().map(|&w| u64::from(w)).sum::<u64>(), 65536);
    }
    assert!(gaussian_kernel_q16(2, 0.0).is_err());
    assert_eq!(gaussian_kernel_q16(0, 0.0).unwrap(), vec![65536]);
}

#[test]
fn blur_keeps_flat_fields_and_spreads_points() {
    let mut flat = [40u8, 80, 120, 255].repeat(16);
    blur_rgba8_premul(&mut flat, 4, 4, 1.5).unwrap();
    assert!(flat.chunks_exact(4).all(|p| p == [40, 80, 120, 255]));

    let mut dot = vec![0u8; 5 * 5 * 4];
    let center = (2 * 5 + 2) * 4;
    dot[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);
    blur_rgba8_premul(&mut dot, 5, 5, 1.0).unwrap();
    assert!(dot[center + 3] < 255);
    assert!(dot[(2 * 5 + 1) * 4 + 3] > 0);

    assert!(blur_rgba8_premul(&mut [0u8; 8], 4, 4, 1.0).is_err());
}

#[test]
fn oversized_blur_is_bounded_by_the_buffer() {
    let mut dot = vec![0u8; 6 * 3 * 4];
    dot[3] = 255;
    blur_rgba8_premul(&mut dot, 6, 3, 1e9).unwrap();
    assert!(dot[3] < 255);
    assert!(dot[5 * 4 + 3] > 0);

    assert!(gaussian_kernel_q16(MAX_BLUR_RADIUS + 1, 1e6).is_err());
    assert!(gaussian_kernel_q16(u32::MAX, 1e9).is_err());
}

#[test]
fn mask_multiplies_by_alpha() {
    let mut buf = vec![200, 100, 50, 255, 200, 100, 50, 255];
    mask_apply_alpha(&mut buf, &[0, 0, 0, 255, 0, 0, 0, 0]).unwrap();
    assert_eq!(buf, vec![200, 100, 50, 255, 0, 0, 0, 0]);
}

#[test]
fn normal_over_respects_opacity() {
    let mut dst = vec![0, 0, 255, 255];
    composite_over_rgba8_premul(&mut dst, &[255, 0, 0, 255], 1.0, BlendMode::Normal).unwrap();
    assert_eq!(dst, vec![255, 0, 0, 255]);

    let mut dst = vec![0, 0, 255, 255];
    composite_over_rgba8_premul(&mut dst, &[255, 0, 0, 255], 0.0, BlendMode::Normal).unwrap();
    assert_eq!(dst, vec![0, 0, 255, 255]);

    let mut dst = vec![0, 0, 0, 255];
    composite_over_rgba8_premul(&mut dst, &[255, 255, 255, 255], 0.5, BlendMode::Normal).unwrap();
    assert_eq!(dst, vec![128, 128, 128, 255]);
}

#[test]
fn multiply_and_screen_blend_opaque_pixels() {
    let mut dst = vec![128, 255, 0, 255];
    composite_over_rgba8_premul(&mut dst, &[255, 128, 128, 255], 1.0, BlendMode::Multiply).unwrap();
    assert_eq!(dst, vec![128, 128, 0, 255]);

    let mut dst = vec![0, 255, 128, 255];
    composite_over_rgba8_premul(&mut dst, &[0, 0, 0, 255], 1.0, BlendMode::Screen).unwrap();
    assert_eq!(dst, vec![0, 255, 128, 255]);

    assert!(composite_over_rgba8_premul(&mut [0; 4], &[0; 8], 1.0, BlendMode::Darken).is_err());
}

#[test]
fn feather_fades_toward_edges() {
    let none = EdgeFeather::default();
    assert_eq!(feather_alpha(0.0, 0.0, 100.0, 100.0, &none), 1.0);

    let sides = EdgeFeather {
        left: 20.0,
        ..EdgeFeather::default()
    };
    assert_eq!(feather_alpha(0.0, 50.0, 100.0, 100.0, &sides), 0.0);
    assert_eq!(feather_alpha(10.0, 50.0, 100.0, 100.0, &sides), 0.5);
    assert_eq!(feather_alpha(60.0, 50.0, 100.0, 100.0, &sides), 1.0);

    let radial = EdgeFeather {
        radial_enabled: true,
        radial_size: 50.0,
        ..EdgeFeather::default()
    };
    assert_eq!(feather_alpha(50.0, 50.0, 100.0, 100.0, &radial), 1.0);
    assert_eq!(feather_alpha(100.0, 50.0, 100.0, 100.0, &radial), 0.0);

    let linear = EdgeFeather {
        linear_enabled: true,
        linear_angle: 0.0,
        linear_size: 30.0,
        ..EdgeFeather::default()
    };
    assert_eq!(feather_alpha(10.0, 50.0, 100.0, 100.0, &linear), 1.0);
    assert_eq!(feather_alpha(100.0, 50.0, 100.0, 100.0, &linear), 0.0);
}
