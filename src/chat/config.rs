// -----------------------------------------------
// CONVERSATION VOCABULARY
// -----------------------------------------------

/// Accepted in any state; resets the session to the first question
pub const RESTART_TOKENS: &[&str] = &["start", "restart", "hola", "inicio"];

pub const CALL_WORDS: &[&str] = &["call", "calls"];
pub const PUT_WORDS: &[&str] = &["put", "puts"];

pub const BUY_WORDS: &[&str] = &["buy", "comprar", "compra"];
pub const SELL_WORDS: &[&str] = &["sell", "vender", "venta"];

pub const YES_WORDS: &[&str] = &["yes", "y", "s", "si", "sí"];
pub const NO_WORDS: &[&str] = &["no", "n"];

pub const ONE_WEEK_WORDS: &[&str] = &["1 week", "1 semana"];
pub const TWO_WEEKS_WORDS: &[&str] = &["2 weeks", "2 semanas"];
pub const ONE_MONTH_WORDS: &[&str] = &["1 month", "1 mes"];
pub const TWO_MONTHS_WORDS: &[&str] = &["2 months", "2 meses"];

/// Stripped from the front of a premium answer
pub const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£'];
