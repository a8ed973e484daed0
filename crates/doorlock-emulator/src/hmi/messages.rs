//! Text shown on the 2x16 character display.

pub const MENU_CHANGE: &str = "+ : Change PASS";
pub const MENU_OPEN: &str = "- : Open Door";

pub const ENTER_OLD: &str = "Enter Old PASS";
pub const ENTER: &str = "Enter  PASS";
pub const ENTER_NEW: &str = "Enter New PASS";
pub const REENTER: &str = "ReEnter PASS";
pub const ENTER_ROOT: &str = "Enter Root PASS";

pub const NOT_MATCHED: &str = "PASS not matched";
pub const CONFIRMED: &str = "Confirmed";

pub const DOOR_OPEN: &str = "Door Open";
pub const DOOR_CLOSE: &str = "Door Close";
pub const BLOCKED: &str = "System Blocked";

/// Echo for one entered digit, written on row 1.
pub const DIGIT_ECHO: &str = "*";
