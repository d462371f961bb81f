use std::env::args_os;

use svd_image_compressor::{run, CLIParser};

fn main() {
    let mut cli_parser = CLIParser::default();
    let arguments = cli_parser.parse(args_os());
    match run(&arguments) {
        Ok(reports) => {
            if arguments.verbose() {
                for report in reports {
                    println!("{}", report);
                }
            }
            println!("Compression successful");
        }
        Err(e) => eprintln!("Compression failed because of: {}", e),
    }
}
