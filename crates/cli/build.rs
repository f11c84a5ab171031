use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let dir_arg = |arg: clap::Arg| {
        arg.value_name("DIR")
            .value_parser(clap::value_parser!(std::path::PathBuf))
    };
    let file_arg = |arg: clap::Arg| {
        arg.value_name("FILE")
            .value_parser(clap::value_parser!(std::path::PathBuf))
    };

    let mut cmd = clap::Command::new("mdyoink")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Yoink web pages into LLM- or Obsidian-ready Markdown")
        .arg(clap::arg!([INPUT] "URL to fetch, local HTML file, or '-' for stdin"))
        .arg(clap::arg!(--url <URL> "Page URL to report when the page is read from a file or stdin"))
        .arg(
            clap::arg!(--scope <SCOPE> "What to extract")
                .default_value("auto")
                .value_parser(["auto", "article", "fullpage", "selection"]),
        )
        .arg(clap::arg!(--selector <CSS> "CSS selector for the content, overriding the saved one"))
        .arg(clap::arg!(--"test-selector" <CSS> "Only report what a CSS selector matches"))
        .arg(file_arg(clap::arg!(--selection <FILE> "HTML fragment to treat as the active selection")))
        .arg(
            clap::arg!(-m --mode <MODE> "Output mode; defaults to the saved setting")
                .value_parser(["llm", "obsidian", "raw"]),
        )
        .arg(clap::arg!(--"strip-links" "Strip links regardless of the mode"))
        .arg(clap::arg!(--"keep-links" "Keep links regardless of the mode"))
        .arg(file_arg(clap::arg!(-o --output <FILE> "Output file (default: stdout)")))
        .arg(dir_arg(clap::arg!(--"download-dir" <DIR> "Save into this directory under a name built from the page title")))
        .arg(dir_arg(clap::arg!(--"settings-dir" <DIR> "Directory holding storage.json")))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").default_value("30"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests"))
        .arg(clap::arg!(--json "Print the extraction result as JSON"))
        .arg(clap::arg!(--tokens "Report the estimated token count"))
        .arg(file_arg(clap::arg!(--"import-selectors" <FILE> "Merge domain selectors from a JSON file")))
        .arg(clap::arg!(--"export-selectors" "Print the saved domain selectors as JSON"))
        .arg(clap::arg!(--"save-selector" "Save --selector for the page's domain"))
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "mdyoink", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "mdyoink", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "mdyoink", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "mdyoink", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
