// src/banner.rs

/// Prints the application startup banner to the console.
pub fn print_banner() {
    let banner = r#"
 _         _____ _
(_)       / ____| |
 _ _ __  | |    | |__   __ _ _ __ __ _  ___
| | '_ \ | |    | '_ \ / _` | '__/ _` |/ _ \
| | | | || |____| | | | (_| | | | (_| |  __/
|_|_| |_| \_____|_| |_|\__,_|_|  \__, |\___|
                                  __/ |
                                 |___/

    Daily In-Charge / In-Control Leadership Quiz
"#;
    println!("{}", banner);
    println!("    version {}\n", env!("CARGO_PKG_VERSION"));
}
