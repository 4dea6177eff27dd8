//! Emoji used by the terminal front end, with plain-text fallbacks.

use console::Emoji;

// Speakers
pub static ASSISTANT: Emoji<'_, '_> = Emoji("🤖 ", "");
pub static USER: Emoji<'_, '_> = Emoji("🙂 ", "");

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[WARN]");

// Search and report
pub static SEARCH: Emoji<'_, '_> = Emoji("🔎 ", "");
pub static LINK: Emoji<'_, '_> = Emoji("🔗 ", "->");
pub static FILE: Emoji<'_, '_> = Emoji("📄 ", "+");
