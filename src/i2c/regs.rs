// Licensed under the Apache-2.0 license

//! MT7621 SM0 (I2C master) register map.

pub const SM0CFG0: usize = 0x08;
pub const SM0DOUT: usize = 0x10;
pub const SM0DIN: usize = 0x14;
pub const SM0ST: usize = 0x18;
pub const SM0AUTO: usize = 0x1C;
pub const SM0CFG1: usize = 0x20;
pub const SM0CFG2: usize = 0x28;
pub const SM0CTL0: usize = 0x40;
pub const SM0CTL1: usize = 0x44;
pub const SM0D0: usize = 0x50;
pub const SM0D1: usize = 0x54;
pub const PINTEN: usize = 0x5C;
pub const PINTST: usize = 0x60;
pub const PINTCL: usize = 0x64;

/// Size of the register window the driver touches.
pub const WINDOW_SIZE: usize = 0x100;

// SM0CFG0
pub const DEVADDR_MASK: u32 = 0x7f;

// SM0ST
pub const ST_DATARDY: u32 = 1 << 2;
pub const ST_SDOEMPTY: u32 = 1 << 1;
pub const ST_BUSY: u32 = 1 << 0;

// SM0AUTO
pub const AUTO_READ_CMD: u32 = 1 << 0;

// SM0CFG2
pub const CFG2_AUTOMODE_EN: u32 = 1 << 0;

// SM0CTL0
pub const CTL0_ODRAIN_HIGH: u32 = 1 << 31;
pub const CTL0_VSYNC_SHIFT: u32 = 28;
pub const CTL0_VSYNC_MASK: u32 = 0x3;
pub const CTL0_VSYNC_PULSE: u32 = 0x1 << CTL0_VSYNC_SHIFT;
pub const CTL0_VSYNC_RISING: u32 = 0x2 << CTL0_VSYNC_SHIFT;
pub const CTL0_CLK_DIV_SHIFT: u32 = 16;
pub const CTL0_CLK_DIV_MASK: u32 = 0xfff;
pub const CTL0_DEG_CNT_SHIFT: u32 = 8;
pub const CTL0_DEG_CNT_MASK: u32 = 0xff;
pub const CTL0_WAIT_HIGH: u32 = 1 << 6;
pub const CTL0_DEG_EN: u32 = 1 << 5;
pub const CTL0_CS_STATUS: u32 = 1 << 4;
pub const CTL0_SCL_STATUS: u32 = 1 << 3;
pub const CTL0_SDA_STATUS: u32 = 1 << 2;
pub const CTL0_SM0_EN: u32 = 1 << 1;
pub const CTL0_SCL_STRETCH: u32 = 1 << 0;

// SM0CTL1
pub const CTL1_ACK_SHIFT: u32 = 16;
pub const CTL1_ACK_MASK: u32 = 0xff;
pub const CTL1_PGLEN_SHIFT: u32 = 8;
pub const CTL1_PGLEN_MASK: u32 = 0x7;
pub const CTL1_MODE_SHIFT: u32 = 4;
pub const CTL1_MODE_MASK: u32 = 0x7;
pub const CTL1_TRI_BUSY: u32 = 1 << 0;

/// Maximum clock divisor representable in SM0CTL0.
pub const CLK_DIV_MAX: u16 = CTL0_CLK_DIV_MASK as u16;

/// SM0CTL0 value applied after every reset.
#[must_use]
pub const fn ctl0_for_divisor(divisor: u16) -> u32 {
    CTL0_ODRAIN_HIGH
        | CTL0_VSYNC_PULSE
        | (((divisor as u32) & CTL0_CLK_DIV_MASK) << CTL0_CLK_DIV_SHIFT)
        | CTL0_WAIT_HIGH
        | CTL0_SM0_EN
}

/// Registers captured in a diagnostic dump, in dump order.
pub const DUMP_ORDER: [(&str, usize); 9] = [
    ("cfg0", SM0CFG0),
    ("dout", SM0DOUT),
    ("din", SM0DIN),
    ("status", SM0ST),
    ("auto", SM0AUTO),
    ("cfg1", SM0CFG1),
    ("cfg2", SM0CFG2),
    ("ctl0", SM0CTL0),
    ("ctl1", SM0CTL1),
];
