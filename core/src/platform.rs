//! Board helpers built on the trusted call path.

use bbapi_abi::index::{
    BIOSIGRP_CXPWRSUPP, BIOSIGRP_GENERAL, BIOSIOFFS_CXPWRSUPP_DISPLAYLINE1,
    BIOSIOFFS_CXPWRSUPP_DISPLAYLINE2, BIOSIOFFS_CXPWRSUPP_ENABLEBACKLIGHT,
    BIOSIOFFS_GENERAL_GETBOARDNAME, CXPWRSUPP_MAX_DISPLAY_LINE,
};
use bbapi_mm::MemoryHost;

use crate::context::BiosApi;
use crate::error::BridgeResult;

pub const DEFAULT_BANNER: &str = concat!("BBAPI ", env!("CARGO_PKG_VERSION"));

/// One NUL-terminated front-panel line.
pub type DisplayLine = [u8; CXPWRSUPP_MAX_DISPLAY_LINE];

/// `text` truncated to fit a display line, NUL padded.
pub fn display_line(text: &str) -> DisplayLine {
    let mut line = [0u8; CXPWRSUPP_MAX_DISPLAY_LINE];
    let len = text.len().min(CXPWRSUPP_MAX_DISPLAY_LINE - 1);
    line[..len].copy_from_slice(&text.as_bytes()[..len]);
    line
}

/// Bytes of `line` before the first NUL.
pub fn line_text(line: &[u8]) -> &[u8] {
    let end = line.iter().position(|&b| b == 0).unwrap_or(line.len());
    &line[..end]
}

pub fn read_board_name<H: MemoryHost>(api: &BiosApi<H>) -> BridgeResult<DisplayLine> {
    let mut board = [0u8; CXPWRSUPP_MAX_DISPLAY_LINE];
    api.read(
        BIOSIGRP_GENERAL,
        BIOSIOFFS_GENERAL_GETBOARDNAME,
        &mut board[..CXPWRSUPP_MAX_DISPLAY_LINE - 1],
    )?;
    Ok(board)
}

/// Returns true if the firmware reports board `name`.
pub fn board_is<H: MemoryHost>(api: &BiosApi<H>, name: &str) -> bool {
    match read_board_name(api) {
        Ok(board) => line_text(&board) == name.as_bytes(),
        Err(_) => false,
    }
}

/// Show `banner` on line 2, the board name on line 1, and turn the backlight
/// on.
pub fn update_display<H: MemoryHost>(api: &BiosApi<H>, banner: &str) -> BridgeResult {
    let line = display_line(banner);
    api.write(BIOSIGRP_CXPWRSUPP, BIOSIOFFS_CXPWRSUPP_DISPLAYLINE2, &line)?;

    let board = read_board_name(api)?;
    api.write(BIOSIGRP_CXPWRSUPP, BIOSIOFFS_CXPWRSUPP_DISPLAYLINE1, &board)?;

    api.write(BIOSIGRP_CXPWRSUPP, BIOSIOFFS_CXPWRSUPP_ENABLEBACKLIGHT, &[0xFF])
}
