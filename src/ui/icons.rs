//! Shared UI icons.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!]");

// Step indicators
pub static RUNNING: Emoji<'_, '_> = Emoji("▶️  ", "[>]");
pub static RECOVERY: Emoji<'_, '_> = Emoji("🔧 ", "[FIX]");
pub static STOP: Emoji<'_, '_> = Emoji("🛑 ", "[STOP]");
pub static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
