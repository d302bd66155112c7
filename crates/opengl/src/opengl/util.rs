use glow::{
    COLOR_BUFFER_BIT, DEBUG_OUTPUT, DEBUG_OUTPUT_SYNCHRONOUS, DEBUG_SEVERITY_HIGH, DEBUG_SEVERITY_NOTIFICATION,
    DEPTH_BUFFER_BIT, HasContext,
};

pub fn viewport(gl: &impl HasContext, x: i32, y: i32, w: u32, h: u32) {
    unsafe {
        gl.viewport(x as _, y as _, w as _, h as _);
    }
}

pub fn clear(gl: &impl HasContext, color: [f32; 4]) {
    unsafe {
        gl.clear_color(color[0], color[1], color[2], color[3]);
        gl.clear(COLOR_BUFFER_BIT | DEPTH_BUFFER_BIT);
    }
}

/// Forward the GL debug output into `log`.
pub fn enable_debug(gl: &mut impl HasContext) {
    unsafe {
        gl.enable(DEBUG_OUTPUT);
        gl.enable(DEBUG_OUTPUT_SYNCHRONOUS);
        gl.debug_message_callback(|_, _, id, severity, message| match severity {
            DEBUG_SEVERITY_HIGH => log::error!("gl [{}]: {}", id, message),
            DEBUG_SEVERITY_NOTIFICATION => log::trace!("gl [{}]: {}", id, message),
            _ => log::warn!("gl [{}]: {}", id, message),
        });
    }
}
