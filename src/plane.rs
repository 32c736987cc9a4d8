//! Primary plane of an output

use crate::crtc::DisplayMode;
use crate::format::{FormatDescriptor, Fourcc};
use crate::hwdb::FormatSet;
use crate::interface::RegisterMap;
use crate::register;
use crate::Error;
use embedded_graphics_core::primitives::Rectangle;
use log::debug;

/// A scanout buffer in device memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Framebuffer {
    /// pixel format
    pub format: Fourcc,
    /// device address of the buffer object
    pub dma_addr: u64,
    /// offset of the first pixel inside the buffer object
    pub offset: u32,
    /// bytes per line
    pub pitch: u32,
}

/// Source rectangle inside the framebuffer, all values in 16.16 fixed point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceRect {
    /// left edge
    pub x: u32,
    /// top edge
    pub y: u32,
    /// width
    pub w: u32,
    /// height
    pub h: u32,
}

impl SourceRect {
    /// Source rectangle covering w x h whole pixels at the origin
    pub fn from_pixels(w: u32, h: u32) -> SourceRect {
        SourceRect {
            x: 0,
            y: 0,
            w: w << 16,
            h: h << 16,
        }
    }
}

/// State of the primary plane for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneState {
    /// attached buffer
    pub framebuffer: Option<Framebuffer>,
    /// part of the buffer to scan out
    pub src: SourceRect,
    /// position on the output
    pub dst: Rectangle,
    /// result of the plane check
    pub visible: bool,
}

/// The primary plane of an output
pub struct PrimaryPlane {
    output: usize,
    formats: &'static FormatSet,
}

impl PrimaryPlane {
    /// Creates the primary plane of an output
    pub fn new(output: usize, formats: &'static FormatSet) -> PrimaryPlane {
        PrimaryPlane { output, formats }
    }

    /// Buffer formats the plane can scan out
    pub fn formats(&self) -> &'static [Fourcc] {
        self.formats.formats
    }

    /// Validates a plane state against the mode of its output and computes the visibility
    /// The plane can neither scale nor be positioned, it always covers the whole output
    pub fn check(&self, state: &mut PlaneState, mode: Option<&DisplayMode>) -> Result<(), Error> {
        state.visible = false;

        let (fb, mode) = match (state.framebuffer, mode) {
            (Some(fb), Some(mode)) => (fb, mode),
            _ => return Ok(()),
        };

        if !self.formats.formats.contains(&fb.format) {
            return Err(Error::UnsupportedPixelFormat(fb.format));
        }

        if state.src.w != state.dst.size.width << 16 || state.src.h != state.dst.size.height << 16 {
            return Err(Error::ScalingUnsupported);
        }

        let active = mode.active_area();
        let clipped = state.dst.intersection(&active);
        if clipped.size.width == 0 || clipped.size.height == 0 {
            return Ok(());
        }
        if state.dst != active {
            return Err(Error::PlaneNotFullscreen);
        }

        state.visible = true;
        Ok(())
    }

    /// Programs the plane registers for the next frame
    pub fn update<R: RegisterMap>(&self, regs: &R, state: &PlaneState) -> Result<(), Error> {
        let output = self.output;

        debug!("Updating output {} primary plane", output);

        regs.update_bits(
            register::fb_config_ex(output),
            register::FB_CONFIG_EX_DISPLAY_ID_MASK,
            (output as u32) << register::FB_CONFIG_EX_DISPLAY_ID_SHIFT,
        )?;

        match (state.visible, state.framebuffer) {
            (true, Some(fb)) => self.program(regs, state, &fb)?,
            _ => {
                regs.write(register::fb_config(output), 0)?;
                regs.write(register::fb_config_ex(output), 0)?;
            }
        }

        regs.set_bits(register::fb_config_ex(output), register::FB_CONFIG_EX_COMMIT)?;
        Ok(())
    }

    fn program<R: RegisterMap>(
        &self,
        regs: &R,
        state: &PlaneState,
        fb: &Framebuffer,
    ) -> Result<(), Error> {
        let output = self.output;

        regs.set_bits(register::fb_config_ex(output), register::FB_CONFIG_EX_FB_EN)?;

        // unknown formats scan out as color 0
        let format = FormatDescriptor::from_fourcc(fb.format);
        let color = format.color.map_or(0, |color| color as u32);
        regs.update_bits(
            register::fb_config(output),
            register::FB_CONFIG_FMT_MASK,
            color << register::FB_CONFIG_FMT_SHIFT,
        )?;
        regs.update_bits(
            register::fb_config(output),
            register::FB_CONFIG_SWIZZLE_MASK,
            (format.swizzle as u32) << register::FB_CONFIG_SWIZZLE_SHIFT,
        )?;
        regs.assign_bits(
            register::fb_config(output),
            register::FB_CONFIG_UV_SWIZZLE_EN,
            format.uv_swizzle,
        )?;

        regs.write(register::fb_address(output), scanout_address(fb, &state.src))?;
        regs.write(register::fb_stride(output), fb.pitch)?;

        // the position fields are 15 bits wide, coordinates wrap like the hardware does
        let x = state.dst.top_left.x as u32;
        let y = state.dst.top_left.y as u32;
        let w = state.dst.size.width;
        let h = state.dst.size.height;
        regs.write(register::fb_top_left(output), register::make_plane_pair(x, y))?;
        regs.write(
            register::fb_bottom_right(output),
            register::make_plane_pair(x.wrapping_add(w), y.wrapping_add(h)),
        )?;
        regs.write(register::fb_size(output), register::make_plane_pair(w, h))?;

        regs.write(
            register::fb_blend_config(output),
            register::FB_BLEND_CONFIG_BLEND_DISABLE,
        )?;
        Ok(())
    }
}

/// Device address of the first scanned out pixel, the hardware takes the lower 32 bits
pub fn scanout_address(fb: &Framebuffer, src: &SourceRect) -> u32 {
    let bpp = fb.format.bytes_per_pixel().unwrap_or(0) as u64;
    let address = fb
        .dma_addr
        .wrapping_add(fb.offset as u64)
        .wrapping_add((src.x >> 16) as u64 * bpp)
        .wrapping_add((src.y >> 16) as u64 * fb.pitch as u64);
    address as u32
}
