// Storage keys
pub const COINS_KEY: &str = "paranoct_coins";
pub const SPAWN_ENABLED_KEY: &str = "spawnCoinsEnabled";
pub const AMBIENT_PREFS_KEY: &str = "paranoct_ambient";

// Timing (milliseconds)
pub const TOKEN_SPAWN_INTERVAL_MS: u32 = 360_000;
pub const TOKEN_LIFETIME_MS: u32 = 120_000;
pub const TOKEN_COLLECT_FADE_MS: u32 = 260;
pub const TOAST_DURATION_MS: u32 = 1600;
pub const SPIN_DURATION_MS: u32 = 5000;
pub const SPIN_FALLBACK_GRACE_MS: u32 = 120;

// Ambient animation
pub const PARTICLE_AREA_PER_UNIT: f64 = 38_000.0;
pub const MIN_PARTICLES: usize = 6;
pub const OPACITY_SCALE: f64 = 0.03;
pub const CONSTRAINED_DENSITY_MIN: f64 = 4.0;
pub const CONSTRAINED_DENSITY_MAX: f64 = 8.0;
pub const CONSTRAINED_ALPHA_CAP: f64 = 6.0;

// Player
pub const DEFAULT_VOLUME: f64 = 0.007;
pub const PLAY_GLYPH: &str = "▶";
pub const PAUSE_GLYPH: &str = "⏸";

// Wheel
pub const POINTER_ANGLE: f64 = 90.0;
pub const MIN_FULL_TURNS: u32 = 5;
pub const MAX_FULL_TURNS: u32 = 8;
pub const SPIN_COST: u32 = 1;
pub const SPIN_BUTTON_IDLE: &str = "Крутить (1 монета)";
pub const SPIN_BUTTON_BUSY: &str = "Крутится...";
pub const WHEEL_RESULT_PREFIX: &str = "Результат: ";

// Notifications
pub const MSG_TOKEN_COLLECTED: &str = "Монетка собрана +1";
pub const MSG_SPIN_NEEDS_COIN: &str = "Нужно 1 монетка, чтобы крутить";
pub const MSG_BONUS_COINS: &str = "+2 монетки!";
pub const MSG_CANNOT_CLOSE_SPINNING: &str = "Нельзя закрыть, пока колесо крутится";
pub const MSG_CANNOT_LEAVE_SPINNING: &str = "Нельзя выйти во время прокрутки";
pub const MSG_SPAWN_ON: &str = "Спавн монеток включён";
pub const MSG_SPAWN_OFF: &str = "Спавн монеток отключён";
pub const MSG_SNOW_ON: &str = "Снег включён";
pub const MSG_SNOW_OFF: &str = "Снег отключён";
pub const MSG_MUTED: &str = "Звук выключён";
pub const MSG_UNMUTED: &str = "Звук включён";
pub const MSG_COPIED: &str = "Скопировано: ";
pub const MSG_COPY_FAILED: &str = "Нельзя скопировать автоматически";
pub const MSG_HANDLE_COPY_FAILED: &str = "Не получилось скопировать";
pub const MSG_PLAYBACK_FAILED: &str = "Не удалось воспроизвести трек";
