pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Composite one premultiplied RGBA8 pixel over an opaque destination pixel.
pub(crate) fn premul_over_opaque(dst: [u8; 3], src: [u8; 4]) -> [u8; 3] {
    if src[3] == 0 {
        return dst;
    }
    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 3];
    for i in 0..3 {
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = src[i].saturating_add(dc);
    }
    out
}

/// Weighted sum of two opaque channels, `a * wa + b * wb` in 0..=255 weight space.
pub(crate) fn mix_channel(a: u8, wa: u8, b: u8, wb: u8) -> u8 {
    mul_div255_u8(u16::from(a), u16::from(wa)).saturating_add(mul_div255_u8(
        u16::from(b),
        u16::from(wb),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div255_rounds_to_nearest() {
        assert_eq!(mul_div255_u8(255, 255), 255);
        assert_eq!(mul_div255_u8(255, 0), 0);
        assert_eq!(mul_div255_u8(128, 128), 64);
    }

    #[test]
    fn premul_over_opaque_endpoints() {
        let dst = [10, 20, 30];
        assert_eq!(premul_over_opaque(dst, [200, 200, 200, 0]), dst);
        assert_eq!(premul_over_opaque(dst, [1, 2, 3, 255]), [1, 2, 3]);
    }

    #[test]
    fn premul_over_opaque_half_black_darkens() {
        let out = premul_over_opaque([248, 248, 248], [0, 0, 0, 128]);
        assert_eq!(out, [mul_div255_u8(248, 127); 3]);
    }

    #[test]
    fn mix_channel_full_weights_select_one_side() {
        assert_eq!(mix_channel(40, 255, 200, 0), 40);
        assert_eq!(mix_channel(40, 0, 200, 255), 200);
        assert_eq!(mix_channel(0, 0, 0, 0), 0);
    }
}
