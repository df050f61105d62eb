//! VDU command bytes understood by the VDP.
//!
//! The bridge treats these as opaque sequences; only their encoding lives
//! here.

pub const VDU_CRSR_LEFT: u8 = 8;
pub const VDU_CRSR_RIGHT: u8 = 9;
pub const VDU_CRSR_DOWN: u8 = 10;
pub const VDU_CRSR_UP: u8 = 11;
pub const VDU_CLS: u8 = 12;
pub const VDU_CR: u8 = 13;
pub const VDU_PAGE_MODE_ON: u8 = 14;
pub const VDU_PAGE_MODE_OFF: u8 = 15;
pub const VDU_CLG: u8 = 16;
pub const VDU_COLOUR: u8 = 17;
pub const VDU_GCOL: u8 = 18;
pub const VDU_PALETTE: u8 = 19;
pub const VDU_MODE: u8 = 22;
/// System command prefix. Shares its code with the graphics viewport command.
pub const VDU_SYS: u8 = 23;
pub const VDU_GVIEWPORT: u8 = 23;
pub const VDU_PLOT: u8 = 25;
pub const VDU_RESET: u8 = 26;
pub const VDU_TVIEWPORT: u8 = 28;
pub const VDU_GRAPH_ORIG: u8 = 29;
pub const VDU_HOME_CRSR: u8 = 30;
pub const VDU_TAB: u8 = 31;
pub const VDU_BACKSPACE: u8 = 127;

/// Link initialization handshake.
pub const VDU_INIT: [u8; 3] = [VDU_SYS, 0, 0x80];

/// Show or hide the text cursor.
pub const fn cursor(enable: bool) -> [u8; 3] {
    [VDU_SYS, 1, if enable { 1 } else { 0 }]
}

/// Program palette entry `index` with an RGB colour.
pub const fn set_palette_rgb(index: u8, r: u8, g: u8, b: u8) -> [u8; 6] {
    [VDU_PALETTE, index, 255, r, g, b]
}

/// Switch screen mode.
pub const fn set_mode(mode: u8) -> [u8; 2] {
    [VDU_MODE, mode]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_handshake() {
        assert_eq!(VDU_INIT, [0x17, 0x00, 0x80]);
    }

    #[test]
    fn test_builders() {
        assert_eq!(cursor(true), [23, 1, 1]);
        assert_eq!(cursor(false), [23, 1, 0]);
        assert_eq!(set_palette_rgb(4, 10, 20, 30), [19, 4, 255, 10, 20, 30]);
        assert_eq!(set_mode(3), [22, 3]);
    }

    #[test]
    fn test_builders_are_const() {
        const MODE_1: [u8; 2] = set_mode(1);
        assert_eq!(MODE_1[0], VDU_MODE);
    }
}
