use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

type LogFile = Arc<Mutex<Option<File>>>;

/// Writer factory that tees every record to stderr and, once configured, to a
/// log file.
#[derive(Clone, Default)]
struct TeeMakeWriter {
    file: LogFile,
}

struct TeeWriter {
    file: LogFile,
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for TeeMakeWriter {
    type Writer = TeeWriter;

    fn make_writer(&'a self) -> Self::Writer {
        TeeWriter {
            file: self.file.clone(),
        }
    }
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = io::stderr().write(buf)?;
        if let Some(file) = self.file.lock().unwrap_or_else(PoisonError::into_inner).as_mut() {
            let _ = file.write_all(buf);
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = self.file.lock().unwrap_or_else(PoisonError::into_inner).as_mut() {
            let _ = file.flush();
        }
        Ok(())
    }
}

static WRITER: OnceLock<TeeMakeWriter> = OnceLock::new();

/// Installs the global subscriber. `RUST_LOG` selects the filter, `info` by
/// default. `log` records are forwarded into tracing.
pub fn init() {
    let _ = tracing_log::LogTracer::init();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let writer = WRITER.get_or_init(TeeMakeWriter::default).clone();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .try_init();
}

/// Points the file half of the writer at `log_file`, or detaches it.
pub fn set_log_file(log_file: Option<&Path>) {
    let Some(writer) = WRITER.get() else {
        return;
    };
    let file = match log_file.map(open_append).transpose() {
        Ok(file) => file,
        Err(e) => {
            log::warn!("Cannot open log file: {}", e);
            None
        }
    };
    *writer.file.lock().unwrap_or_else(PoisonError::into_inner) = file;
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
