use va_config::{cli, logging};

fn main() {
    // Cargar .env si existe para obtener DATABASE_URL / DB_*
    va_persistence::init_dotenv();
    if let Err(e) = logging::init() {
        eprintln!("[va-db] logging init failed: {e}");
    }
    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = cli::parse(&args).and_then(|cmd| {
                                      let mut out = std::io::stdout().lock();
                                      cli::run(cmd, |key| std::env::var(key).ok(), &mut out)
                                  });
    let code = match result {
        Ok(()) => cli::EXIT_OK,
        Err(e) => {
            eprintln!("[va-db] {e}");
            e.exit_code()
        }
    };
    std::process::exit(code);
}
