// Full register map of the controller, not every field is driven yet
#![allow(dead_code)]

// ---- Top level registers -----------------------------------------------------------------------

pub const TOP_RST: u32 = 0x0000; // Reset control

pub const TOP_IRQ_ACK: u32 = 0x0010; // IRQ status, cleared on read
pub const TOP_IRQ_EN: u32 = 0x0014; // IRQ enable

/// vsync interrupt of output n, valid for both TOP_IRQ_ACK and TOP_IRQ_EN
pub const fn top_irq_vsync(n: usize) -> u32 {
    1 << n
}

pub const TOP_CHIP_MODEL: u32 = 0x0020;
pub const TOP_CHIP_REV: u32 = 0x0024;
pub const TOP_CHIP_CUSTOMER_ID: u32 = 0x0030;

/// Highest register offset of the controller
pub const MAX_REGISTER: u32 = 0x2544;

const fn per_output(base: u32, n: usize) -> u32 {
    base + 0x4 * n as u32
}

// ---- Display timing registers ------------------------------------------------------------------

pub const fn disp_dither_config(n: usize) -> u32 {
    per_output(0x1410, n)
}
pub const fn disp_dither_table_low(n: usize) -> u32 {
    per_output(0x1420, n)
}
pub const DISP_DITHER_TABLE_LOW_DEFAULT: u32 = 0x7B48_F3C0;
pub const fn disp_dither_table_high(n: usize) -> u32 {
    per_output(0x1428, n)
}
pub const DISP_DITHER_TABLE_HIGH_DEFAULT: u32 = 0x596A_D1E2;

pub const fn disp_hsize(n: usize) -> u32 {
    per_output(0x1430, n)
}
pub const fn disp_hsync(n: usize) -> u32 {
    per_output(0x1438, n)
}
pub const fn disp_vsize(n: usize) -> u32 {
    per_output(0x1440, n)
}
pub const fn disp_vsync(n: usize) -> u32 {
    per_output(0x1448, n)
}
pub const fn disp_current_location(n: usize) -> u32 {
    per_output(0x1450, n)
}
pub const fn disp_gamma_index(n: usize) -> u32 {
    per_output(0x1458, n)
}
pub const fn disp_gamma_data(n: usize) -> u32 {
    per_output(0x1460, n)
}

// HSIZE / VSIZE layout
pub const DISP_SIZE_FIELD_MASK: u32 = 0x7FFF; // 15 bit fields
pub const DISP_SIZE_TOTAL_SHIFT: u32 = 16;

// HSYNC / VSYNC layout
pub const DISP_SYNC_END_SHIFT: u32 = 15;
pub const DISP_SYNC_EN: u32 = 1 << 30;
pub const DISP_SYNC_POL: u32 = 1 << 31;

// ---- Panel / output interface registers --------------------------------------------------------

pub const fn disp_panel_config(n: usize) -> u32 {
    per_output(0x1418, n)
}
pub const PANEL_CONFIG_DE_EN: u32 = 1 << 0;
pub const PANEL_CONFIG_DE_POL: u32 = 1 << 1;
pub const PANEL_CONFIG_DAT_EN: u32 = 1 << 4;
pub const PANEL_CONFIG_DAT_POL: u32 = 1 << 5;
pub const PANEL_CONFIG_CLK_EN: u32 = 1 << 8;
pub const PANEL_CONFIG_CLK_POL: u32 = 1 << 9;
pub const PANEL_CONFIG_RUNNING: u32 = 1 << 12;
pub const PANEL_CONFIG_YUV: u32 = 1 << 16;

pub const fn disp_dpi_config(n: usize) -> u32 {
    per_output(0x14B8, n)
}
pub const DPI_CONFIG_FMT_RGB888: u32 = 5;

/// Shared between all outputs
pub const DISP_PANEL_START: u32 = 0x1CCC;
pub const fn panel_start_running(n: usize) -> u32 {
    1 << n
}
pub const PANEL_START_MULTI_DISP_SYNC: u32 = 1 << 3;

pub const fn disp_dp_config(n: usize) -> u32 {
    per_output(0x1CD0, n)
}
pub const DP_CONFIG_DP_EN: u32 = 1 << 3;
pub const DP_CONFIG_FMT_RGB565: u32 = 0;
pub const DP_CONFIG_FMT_RGB666: u32 = 1;
pub const DP_CONFIG_FMT_RGB888: u32 = 2;
pub const DP_CONFIG_FMT_RGB101010: u32 = 3;
pub const DP_CONFIG_YUV_FMT_UYVY8: u32 = 2 << 4;
pub const DP_CONFIG_YUV_FMT_YUV8: u32 = 4 << 4;
pub const DP_CONFIG_YUV_FMT_UYVY10: u32 = 8 << 4;
pub const DP_CONFIG_YUV_FMT_YUV10: u32 = 10 << 4;
pub const DP_CONFIG_YUV_FMT_UYYVYY8: u32 = 12 << 4;
pub const DP_CONFIG_YUV_FMT_UYYVYY10: u32 = 13 << 4;

pub const fn disp_panel_config_ex(n: usize) -> u32 {
    per_output(0x2518, n)
}
pub const PANEL_CONFIG_EX_COMMIT: u32 = 1 << 0;

// ---- Primary plane registers -------------------------------------------------------------------

pub const fn fb_address(n: usize) -> u32 {
    per_output(0x1400, n)
}
pub const fn fb_stride(n: usize) -> u32 {
    per_output(0x1408, n)
}

pub const fn fb_config(n: usize) -> u32 {
    per_output(0x1518, n)
}
pub const FB_CONFIG_CLEAR_EN: u32 = 1 << 8;
pub const FB_CONFIG_ROT_SHIFT: u32 = 11; // bits 13:11
pub const FB_CONFIG_YUV_SPACE_SHIFT: u32 = 14; // bits 16:14
// bits 21:17, the vendor header shifts this by 14 which overlaps YUV_SPACE
pub const FB_CONFIG_TILE_MODE_MASK: u32 = 0x1F << 17;
pub const FB_CONFIG_TILE_MODE_SHIFT: u32 = 17;
pub const FB_CONFIG_SCALE_EN: u32 = 1 << 22;
pub const FB_CONFIG_SWIZZLE_MASK: u32 = 0x3 << 23;
pub const FB_CONFIG_SWIZZLE_SHIFT: u32 = 23;
pub const FB_CONFIG_UV_SWIZZLE_EN: u32 = 1 << 25;
pub const FB_CONFIG_FMT_MASK: u32 = 0x3F << 26;
pub const FB_CONFIG_FMT_SHIFT: u32 = 26;

pub const fn fb_size(n: usize) -> u32 {
    per_output(0x1810, n)
}

pub const fn fb_config_ex(n: usize) -> u32 {
    per_output(0x1CC0, n)
}
pub const FB_CONFIG_EX_COMMIT: u32 = 1 << 12;
pub const FB_CONFIG_EX_FB_EN: u32 = 1 << 13;
pub const FB_CONFIG_EX_ZPOS_MASK: u32 = 0x7 << 16;
pub const FB_CONFIG_EX_DISPLAY_ID_MASK: u32 = 1 << 19;
pub const FB_CONFIG_EX_DISPLAY_ID_SHIFT: u32 = 19;

pub const fn fb_top_left(n: usize) -> u32 {
    per_output(0x24D8, n)
}
pub const fn fb_bottom_right(n: usize) -> u32 {
    per_output(0x24E0, n)
}

pub const fn fb_blend_config(n: usize) -> u32 {
    per_output(0x2510, n)
}
pub const FB_BLEND_CONFIG_BLEND_DISABLE: u32 = 1 << 1;

/// Packs a plane position or size into the 15 bit x / 15 bit y layout
pub const fn make_plane_pair(x: u32, y: u32) -> u32 {
    (x & 0x7FFF) | ((y & 0x7FFF) << 15)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_output_stride_is_one_word() {
        assert_eq!(disp_hsize(0), 0x1430);
        assert_eq!(disp_hsize(1), 0x1434);
        assert_eq!(fb_config_ex(1), 0x1CC4);
        assert_eq!(disp_panel_config_ex(1), 0x251C);
    }

    #[test]
    fn tile_mode_does_not_overlap_yuv_space() {
        let yuv_space_mask = 0x7 << FB_CONFIG_YUV_SPACE_SHIFT;
        assert_eq!(FB_CONFIG_TILE_MODE_MASK & yuv_space_mask, 0);
        assert_eq!(FB_CONFIG_TILE_MODE_MASK & FB_CONFIG_SCALE_EN, 0);
    }

    #[test]
    fn plane_pair_masks_to_15_bits() {
        assert_eq!(make_plane_pair(1920, 1080), 1920 | (1080 << 15));
        assert_eq!(make_plane_pair(0x8001, 0), 1);
    }
}
