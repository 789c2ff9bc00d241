fn main() {
    use clap::Parser;
    use std::error::Error;
    let args = hdrcombine::cli::Args::parse();
    hdrcombine::cli::init_logging(args.verbose);
    if let Err(e) = hdrcombine::cli::run(&args) {
        eprintln!("{}", e);
        if args.verbose {
            let mut source = e.source();
            while let Some(s) = source {
                eprintln!("  cause: {}", s);
                source = s.source();
            }
        }
        std::process::exit(e.exit_code());
    }
}
