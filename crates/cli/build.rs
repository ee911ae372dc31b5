use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("pagesift")
        .version("0.1.0")
        .author("Pagesift Contributors")
        .about("Measure visible and main-content words on rendered web pages")
        .arg(clap::arg!(<URL> ... "URLs to analyze"))
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (table, json)")
                .value_name("FORMAT")
                .default_value("table")
                .value_parser(["table", "json"]),
        )
        .arg(clap::arg!(-c --concurrency <NUM> "Maximum number of pages analyzed concurrently").default_value("4"))
        .arg(clap::arg!(--nav_timeout <SECS> "Per-page navigation timeout in seconds").default_value("30"))
        .arg(clap::arg!(--batch_timeout <SECS> "Overall batch deadline in seconds"))
        .arg(clap::arg!(--retries <NUM> "Extra navigation attempts per page after a failure").default_value("0"))
        .arg(
            clap::arg!(--chrome <PATH> "Explicit browser executable to launch")
                .value_name("PATH")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(-v --verbose "Enable progress output"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "pagesift", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "pagesift", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "pagesift", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "pagesift", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
