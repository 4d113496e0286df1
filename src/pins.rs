//! GPIO / peripheral pin assignments for the water-routing slave board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Output chain (4 × 74HC595)
// ---------------------------------------------------------------------------

/// Master reset, active LOW.
pub const SR_MR_GPIO: i32 = 3;
/// Serial data in.
pub const SR_DS_GPIO: i32 = 14;
/// Storage-register clock (latch).
pub const SR_STCP_GPIO: i32 = 21;
/// Shift-register clock.
pub const SR_SHCP_GPIO: i32 = 47;
/// Output enable, active LOW.
pub const SR_OE_GPIO: i32 = 48;

// ---------------------------------------------------------------------------
// Current-sense front end (INA219 behind a TCA9548 multiplexer)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
pub const I2C_FREQ_HZ: u32 = 100_000;

pub const INA219_ADDR: u8 = 0x40;
pub const TCA9548_ADDR: u8 = 0x70;

/// Address lines of the discrete multiplexer fallback (A0, A1, A2).
pub const MUX_A0_GPIO: i32 = 4;
pub const MUX_A1_GPIO: i32 = 5;
pub const MUX_A2_GPIO: i32 = 6;

// ---------------------------------------------------------------------------
// Buttons (active LOW, internal pull-up)
// ---------------------------------------------------------------------------

pub const BUTTON_BE1_GPIO: i32 = 7;
pub const BUTTON_BE2_GPIO: i32 = 15;
pub const BUTTON_BD1_GPIO: i32 = 16;
pub const BUTTON_BD2_GPIO: i32 = 17;
pub const BUTTON_BH_GPIO: i32 = 18;

// ---------------------------------------------------------------------------
// Peer link (UART to the main board)
// ---------------------------------------------------------------------------

pub const PEER_UART_TX_GPIO: i32 = 43;
pub const PEER_UART_RX_GPIO: i32 = 44;
pub const PEER_UART_BAUD: u32 = 115_200;
