pub const TITLE_MAX_CHARS: usize = 50;

pub const FILE_PATHS: FilePaths = FilePaths {
    notes: "notes.json",
    log_basename: "noteapp",
};

pub const APP_DIRS: AppDirs = AppDirs {
    qualifier: "com",
    organization: "noteapp",
    application: "noteapp",
};

pub const LOG_SETTINGS: LogSettings = LogSettings {
    max_file_bytes: 5 * 1024 * 1024,
    max_files: 3,
};

pub const JSON_INDENT: &[u8] = b"    ";

pub struct FilePaths {
    pub notes: &'static str,
    pub log_basename: &'static str,
}

pub struct AppDirs {
    pub qualifier: &'static str,
    pub organization: &'static str,
    pub application: &'static str,
}

pub struct LogSettings {
    pub max_file_bytes: u64,
    pub max_files: usize,
}
