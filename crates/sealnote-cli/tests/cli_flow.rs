use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use sealnote_core::crypto::KdfParams;
use sealnote_core::keys::import_legacy_password;
use sealnote_core::{KeyManager, NoteStore, StoreOptions};
use tempfile::TempDir;

const PASSWORD: &str = "correct-horse-battery";

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_sealnote"))
}

/// An isolated home: its own XDG config and data dirs.
struct Env {
    root: TempDir,
}

impl Env {
    fn new() -> Self {
        let root = TempDir::new().expect("create temp dir");
        std::fs::create_dir_all(root.path().join("config")).expect("create config dir");
        std::fs::create_dir_all(root.path().join("data")).expect("create data dir");
        Self { root }
    }

    fn config_home(&self) -> PathBuf {
        self.root.path().join("config")
    }

    fn config_dir(&self) -> PathBuf {
        self.config_home().join("sealnote")
    }

    fn notes_dir(&self) -> PathBuf {
        self.root.path().join("notes")
    }

    fn command(&self, password: &str) -> Command {
        let mut cmd = Command::new(bin());
        cmd.env("XDG_CONFIG_HOME", self.config_home())
            .env("XDG_DATA_HOME", self.root.path().join("data"))
            .env("SEALNOTE_PASSWORD", password)
            .env_remove("SEALNOTE_CONFIG")
            .env_remove("SEALNOTE_NOTES_DIR")
            .env_remove("SEALNOTE_LOG")
            .arg("--no-input");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.run_with_password(PASSWORD, args)
    }

    fn run_with_password(&self, password: &str, args: &[&str]) -> Output {
        self.command(password)
            .args(args)
            .output()
            .expect("run sealnote")
    }

    fn init(&self, notes_dir: &Path) {
        let output = self.run(&[
            "init",
            notes_dir.to_str().expect("utf-8 path"),
            "--kdf-iterations",
            "1",
            "--kdf-memory-kib",
            "64",
            "--kdf-parallelism",
            "1",
        ]);
        assert_success(&output);
    }
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "command failed: {}\nstdout: {}",
        String::from_utf8_lossy(&output.stderr),
        String::from_utf8_lossy(&output.stdout)
    );
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn json(output: &Output) -> serde_json::Value {
    assert_success(output);
    serde_json::from_slice(&output.stdout).expect("valid json output")
}

fn add_note(env: &Env, content: &str) -> String {
    let value = json(&env.run(&["add", content, "--json"]));
    value["id"].as_str().expect("note id").to_string()
}

#[test]
fn test_init_add_list_show() {
    let env = Env::new();
    env.init(&env.notes_dir());
    assert!(env.config_dir().join("config.toml").exists());
    assert!(env.notes_dir().join(".sealnote-salt.json").exists());

    let first = add_note(&env, "Buy milk");
    let second = add_note(&env, "Call the plumber");
    assert!(env.notes_dir().join(format!("{}.json", first)).exists());

    let raw = std::fs::read_to_string(env.notes_dir().join(format!("{}.json", first)))
        .expect("read record");
    assert!(!raw.contains("Buy milk"));

    let listed = json(&env.run(&["list", "--json"]));
    let ids: Vec<&str> = listed
        .as_array()
        .expect("array")
        .iter()
        .map(|note| note["id"].as_str().expect("id"))
        .collect();
    assert_eq!(ids, vec![second.as_str(), first.as_str()]);

    let shown = env.run(&["show", &first]);
    assert_success(&shown);
    assert!(stdout(&shown).contains("Buy milk"));

    let found = json(&env.run(&["search", "PLUMBER", "--json"]));
    assert_eq!(found.as_array().expect("array").len(), 1);
    assert_eq!(found[0]["id"], second.as_str());
}

#[test]
fn test_add_reads_stdin() {
    let env = Env::new();
    env.init(&env.notes_dir());

    let mut child = env
        .command(PASSWORD)
        .args(["add", "--json"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn sealnote");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(b"from a pipe\n")
        .expect("write stdin");
    let output = child.wait_with_output().expect("wait for sealnote");

    assert_eq!(json(&output)["content"], "from a pipe");
}

#[test]
fn test_edit_replaces_content() {
    let env = Env::new();
    env.init(&env.notes_dir());
    let id = add_note(&env, "draft");

    let edited = json(&env.run(&["edit", &id, "final", "--json"]));
    assert_eq!(edited["content"], "final");
    assert_ne!(edited["updated_at"], edited["created_at"]);

    let shown = json(&env.run(&["show", &id, "--json"]));
    assert_eq!(shown["content"], "final");
}

#[test]
fn test_wrong_password_exits_with_auth_code() {
    let env = Env::new();
    env.init(&env.notes_dir());
    add_note(&env, "secret");

    let output = env.run_with_password("not-the-password", &["list"]);
    assert_eq!(output.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Incorrect password"));
}

#[test]
fn test_missing_note_and_missing_config_exit_codes() {
    let env = Env::new();
    let output = env.run(&["list"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("sealnote init"));

    env.init(&env.notes_dir());
    let output = env.run(&["show", "abcdef123456"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_init_refuses_to_overwrite_without_force() {
    let env = Env::new();
    env.init(&env.notes_dir());

    let output = env.run(&["init", env.notes_dir().to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(2));

    let output = env.run(&[
        "init",
        env.notes_dir().to_str().expect("utf-8 path"),
        "--force",
    ]);
    assert_success(&output);
    assert!(stdout(&output).contains("Keeping the existing salted password setup"));
}

#[test]
fn test_trash_restore_archive_purge() {
    let env = Env::new();
    env.init(&env.notes_dir());
    let keep = add_note(&env, "keep me");
    let doomed = add_note(&env, "throw away");

    let trashed = json(&env.run(&["trash", &doomed, "--json"]));
    assert_eq!(trashed["category"], "trash");
    assert_eq!(trashed["previous_category"], "active");

    let active = json(&env.run(&["list", "--json"]));
    assert_eq!(active.as_array().expect("array").len(), 1);
    let hidden = json(&env.run(&["search", "throw", "--json"]));
    assert!(hidden.as_array().expect("array").is_empty());
    let with_trash = json(&env.run(&["search", "throw", "--include-trash", "--json"]));
    assert_eq!(with_trash.as_array().expect("array").len(), 1);

    let restored = json(&env.run(&["restore", &doomed, "--json"]));
    assert_eq!(restored["category"], "active");

    let archived = json(&env.run(&["archive", &keep, "--json"]));
    assert_eq!(archived["category"], "archived");
    let listed = json(&env.run(&["list", "--category", "archived", "--json"]));
    assert_eq!(listed[0]["id"], keep.as_str());

    // Purge only applies to trashed notes.
    let output = env.run(&["purge", &doomed]);
    assert_eq!(output.status.code(), Some(2));

    assert_success(&env.run(&["trash", &doomed]));
    assert_success(&env.run(&["purge", &doomed]));
    assert!(!env.notes_dir().join(format!("{}.json", doomed)).exists());

    assert_success(&env.run(&["trash", &keep]));
    let output = env.run(&["purge", "--all"]);
    assert_success(&output);
    assert!(stdout(&output).contains("Purged 1 note(s)"));
    let all = json(&env.run(&["list", "--category", "all", "--json"]));
    assert!(all.as_array().expect("array").is_empty());
}

#[test]
fn test_status_without_password() {
    let env = Env::new();
    let before = json(&env.run(&["status", "--json"]));
    assert_eq!(before["initialized"], false);

    env.init(&env.notes_dir());
    add_note(&env, "one");

    let after = json(&env.run_with_password("", &["status", "--json"]));
    assert_eq!(after["initialized"], true);
    assert_eq!(after["key_method"], "salted");
    assert_eq!(after["shared_salt"], true);
    assert_eq!(after["pending_migration"], false);
    assert_eq!(after["records"], 1);
}

#[test]
fn test_second_device_joins_shared_directory() {
    let first = Env::new();
    let second = Env::new();
    let shared = first.notes_dir();
    first.init(&shared);
    let id = add_note(&first, "written on the laptop");

    let output = second.run_with_password("wrong-password", &["init", shared.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(4));
    assert!(!second.config_dir().join("config.toml").exists());

    second.init(&shared);
    let shown = json(&second.run(&["--notes-dir", shared.to_str().expect("utf-8 path"), "show", &id, "--json"]));
    assert_eq!(shown["content"], "written on the laptop");
}

#[test]
fn test_refresh_reports_json() {
    let env = Env::new();
    env.init(&env.notes_dir());
    add_note(&env, "one");
    add_note(&env, "two");

    let value = json(&env.run(&["refresh", "--json"]));
    assert_eq!(value["reload"]["loaded"], 2);
    assert_eq!(value["refresh"]["unchanged"], 2);
    assert_eq!(value["refresh"]["added"], 0);
}

#[test]
fn test_migrate_upgrades_legacy_setup() {
    let env = Env::new();
    let notes = env.notes_dir();
    std::fs::create_dir_all(env.config_dir()).expect("create config dir");
    std::fs::create_dir_all(&notes).expect("create notes dir");
    import_legacy_password(&env.config_dir(), PASSWORD).expect("import legacy password");
    std::fs::write(
        env.config_dir().join("config.toml"),
        format!(
            "[vault]\nnotes_dir = \"{}\"\n\n[kdf]\niterations = 1\nmemory_kib = 64\nparallelism = 1\n",
            notes.display()
        ),
    )
    .expect("write config");

    let fast = KdfParams::new(1, 64, 1);
    let keys = KeyManager::new(env.config_dir(), fast).with_shared_dir(&notes);
    let legacy_key = keys.verify(PASSWORD).expect("verify legacy").into_key();
    let store = NoteStore::open(&notes, StoreOptions::default().without_watcher())
        .expect("open store");
    store.unlock(legacy_key).expect("unlock with legacy key");
    let note = store.create("from before the upgrade").expect("create note");
    store.close();

    let status = json(&env.run(&["status", "--json"]));
    assert_eq!(status["key_method"], "legacy");

    let output = env.run(&["migrate"]);
    assert_success(&output);
    assert!(stdout(&output).contains("re-encrypted 1 note(s)"));

    let status = json(&env.run(&["status", "--json"]));
    assert_eq!(status["key_method"], "salted");
    assert!(!env.config_dir().join("key.legacy.json").exists());

    let shown = json(&env.run(&["show", &note.id, "--json"]));
    assert_eq!(shown["content"], "from before the upgrade");

    let output = env.run(&["migrate"]);
    assert_success(&output);
    assert!(stdout(&output).contains("Already using salted"));
}
