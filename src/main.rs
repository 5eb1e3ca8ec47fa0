//! json-adapter: JSON adapter suggestions for an interactive shell.
//!
//! Default mode speaks a line-delimited JSON protocol on stdin/stdout for the
//! lifetime of a shell session. See `host` for the request types.
//!
//! Flags:
//!   --suggest <command line...>   Print the suggested rewrite, exit 1 if none
//!   --dump-config                 Print the merged configuration as TOML

use json_adapter::config::Config;
use json_adapter::engine::CancellationToken;
use json_adapter::host::Registration;
use json_adapter::logging;
use json_adapter::provider::FeedbackProvider;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = Config::load();

    if args.first().map(String::as_str) == Some("--dump-config") {
        match config.to_toml() {
            Ok(text) => print!("{text}"),
            Err(e) => {
                eprintln!("json-adapter: cannot render config: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    logging::init(&config.settings.log_level);

    let registration = match Registration::register(&config) {
        Ok(r) => r,
        Err(e) => {
            log::error!("startup failed: {e}");
            eprintln!("json-adapter: {e}");
            std::process::exit(2);
        }
    };

    if args.first().map(String::as_str) == Some("--suggest") {
        let command_line = args[1..].join(" ");
        let item = registration.provider().get_feedback(
            &command_line,
            None,
            &CancellationToken::new(),
        );
        registration.unregister();
        match item.and_then(|i| i.suggested_texts.into_iter().next()) {
            Some(text) => println!("{text}"),
            None => std::process::exit(1),
        }
        return;
    }

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let result = registration.serve(stdin.lock(), stdout.lock());
    registration.unregister();
    if let Err(e) = result {
        log::error!("protocol stream failed: {e}");
        eprintln!("json-adapter: {e}");
        std::process::exit(1);
    }
}
