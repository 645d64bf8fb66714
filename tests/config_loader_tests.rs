use showroom::config::ConfigLoader;
use std::{
    env, fs,
    path::PathBuf,
    sync::{Mutex, MutexGuard, OnceLock},
};
use tempfile::TempDir;

const KEYS: [&str; 10] = [
    "SHOWROOM_PROFILE",
    "SHOWROOM_API_BIND_ADDR",
    "SHOWROOM_LOG_LEVEL",
    "SHOWROOM_BACKEND_URL",
    "SHOWROOM_BACKEND_ANON_KEY",
    "SHOWROOM_PRICE_STEP",
    "SHOWROOM_PORT",
    "VITE_SUPABASE_URL",
    "VITE_SUPABASE_ANON_KEY",
    "PORT",
];

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn env_guard() -> MutexGuard<'static, ()> {
    env_lock()
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

fn clear_env() {
    for key in KEYS {
        unsafe {
            env::remove_var(key);
        }
    }
}

fn write_env_file(dir: &TempDir, name: &str, contents: &str) {
    fs::write(dir.path().join(name), contents).unwrap();
}

fn loader(dir: &TempDir) -> ConfigLoader {
    ConfigLoader::with_base_dir(PathBuf::from(dir.path()))
}

#[test]
fn loads_defaults_when_no_env_present() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    let cfg = loader(&temp_dir).load().expect("config loads with defaults");

    assert_eq!(cfg.profile, "local");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:3000");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.price_step, 10_000.0);
    assert!(!cfg.is_backend_configured());
    assert!(cfg.backend_config().unwrap().is_none());
    cfg.bind_addr().expect("default bind addr parses");
    clear_env();
}

#[test]
fn layered_env_files_apply_in_order() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "SHOWROOM_API_BIND_ADDR=127.0.0.1:3000\n");
    write_env_file(
        &temp_dir,
        ".env.test",
        "SHOWROOM_API_BIND_ADDR=192.168.0.10:5000\n",
    );
    write_env_file(
        &temp_dir,
        ".env.test.local",
        "SHOWROOM_API_BIND_ADDR=10.0.0.5:6000\n",
    );

    // Select profile via .env.local before profile-specific files load.
    write_env_file(
        &temp_dir,
        ".env.local",
        "SHOWROOM_PROFILE=test\nSHOWROOM_API_BIND_ADDR=127.0.0.1:4000\n",
    );

    let cfg = loader(&temp_dir)
        .load()
        .expect("config loads with layered env files");

    assert_eq!(cfg.profile, "test");
    assert_eq!(cfg.api_bind_addr, "10.0.0.5:6000");
    clear_env();
}

#[test]
fn os_environment_has_highest_precedence() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "SHOWROOM_API_BIND_ADDR=127.0.0.1:3000\n");

    unsafe {
        env::set_var("SHOWROOM_API_BIND_ADDR", "0.0.0.0:9090");
    }

    let cfg = loader(&temp_dir).load().expect("config loads with env override");
    assert_eq!(cfg.api_bind_addr, "0.0.0.0:9090");

    clear_env();
}

#[test]
fn frontend_variable_names_are_accepted() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "VITE_SUPABASE_URL=https://project.supabase.co\nVITE_SUPABASE_ANON_KEY=anon-from-vite\n",
    );

    let cfg = loader(&temp_dir).load().expect("aliases load");
    assert_eq!(cfg.backend_url.as_deref(), Some("https://project.supabase.co"));
    assert!(cfg.is_backend_configured());

    let backend = cfg.backend_config().unwrap().expect("backend configured");
    assert_eq!(backend.anon_key, "anon-from-vite");
    assert_eq!(backend.bucket, "car-images");

    clear_env();
}

#[test]
fn prefixed_keys_win_over_aliases() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "VITE_SUPABASE_URL=https://alias.supabase.co\nSHOWROOM_BACKEND_URL=https://prefixed.supabase.co\n",
    );

    let cfg = loader(&temp_dir).load().expect("config loads");
    assert_eq!(cfg.backend_url.as_deref(), Some("https://prefixed.supabase.co"));

    clear_env();
}

#[test]
fn port_replaces_the_bind_port() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "SHOWROOM_API_BIND_ADDR=127.0.0.1:3000\n");
    unsafe {
        env::set_var("PORT", "8123");
    }

    let cfg = loader(&temp_dir).load().expect("config loads with PORT");
    assert_eq!(cfg.api_bind_addr, "127.0.0.1:8123");

    unsafe {
        env::set_var("PORT", "eighty");
    }
    let err = loader(&temp_dir).load().expect_err("bad PORT fails");
    assert!(err.to_string().contains("invalid PORT"));

    clear_env();
}

#[test]
fn invalid_bind_addr_returns_error() {
    let _guard = env_guard();
    clear_env();

    unsafe {
        env::set_var("SHOWROOM_API_BIND_ADDR", "not-an-addr");
    }
    let temp_dir = TempDir::new().unwrap();
    let err = loader(&temp_dir)
        .load()
        .expect_err("invalid bind addr should fail");
    assert!(format!("{}", err).contains("invalid api bind address"));

    clear_env();
}

#[test]
fn numeric_settings_are_strict() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(&temp_dir, ".env", "SHOWROOM_PRICE_STEP=ten thousand\n");

    let err = loader(&temp_dir).load().expect_err("non-numeric step fails");
    assert!(err.to_string().contains("PRICE_STEP must be a number"));

    write_env_file(&temp_dir, ".env", "SHOWROOM_PRICE_STEP=0\n");
    let err = loader(&temp_dir).load().expect_err("zero step fails");
    assert!(err.to_string().contains("PRICE_STEP must be positive"));

    clear_env();
}

#[test]
fn backend_url_must_be_http() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "SHOWROOM_BACKEND_URL=ftp://project.example\nSHOWROOM_BACKEND_ANON_KEY=k\n",
    );

    let err = loader(&temp_dir).load().expect_err("ftp url fails");
    assert!(err.to_string().contains("must use http or https"));

    clear_env();
}

#[test]
fn redacted_json_hides_the_anon_key() {
    let _guard = env_guard();
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    write_env_file(
        &temp_dir,
        ".env",
        "SHOWROOM_BACKEND_URL=https://project.supabase.co\nSHOWROOM_BACKEND_ANON_KEY=super-secret\n",
    );

    let cfg = loader(&temp_dir).load().unwrap();
    let json = cfg.redacted_json().unwrap();
    assert!(!json.contains("super-secret"));
    assert!(json.contains("[REDACTED]"));
    assert!(json.contains("https://project.supabase.co"));

    clear_env();
}
