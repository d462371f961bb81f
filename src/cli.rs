use crate::rank_search::THRESHOLD;
use crate::Arguments;
use clap::{
    arg, crate_authors, crate_description, crate_name, crate_version, value_parser, Arg,
    ArgAction, ArgMatches, Command,
};
use std::ffi::OsString;
use std::path::PathBuf;
use std::{io, thread};

pub struct CLIParser {
    command: Command,
}

impl CLIParser {
    pub fn new() -> Self {
        let command = Self::create_base_command();
        let command = Self::register_arguments(command);
        CLIParser { command }
    }

    pub fn parse<I, T>(&mut self, itr: I) -> Arguments
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self
            .command
            .try_get_matches_from_mut(itr)
            .unwrap_or_else(|e| e.exit());
        Self::extract_arguments(&matches)
    }

    fn register_arguments(command: Command) -> Command {
        let command = Self::register_input_file_argument(command);
        let command = Self::register_output_file_argument(command);
        let command = Self::register_rank_argument(command);
        let command = Self::register_verbose_argument(command);
        let command = Self::register_threads_argument(command);
        let command = Self::register_threshold_argument(command);
        let command = Self::register_max_iterations_argument(command);
        Self::register_sweep_argument(command)
    }

    fn register_input_file_argument(command: Command) -> Command {
        command.arg(Self::create_input_file_argument())
    }

    fn register_output_file_argument(command: Command) -> Command {
        command.arg(Self::create_output_file_argument())
    }

    fn register_rank_argument(command: Command) -> Command {
        command.arg(Self::create_rank_argument())
    }

    fn register_verbose_argument(command: Command) -> Command {
        command.arg(Self::create_verbose_argument())
    }

    fn register_threads_argument(command: Command) -> Command {
        command.arg(Self::create_threads_argument())
    }

    fn register_threshold_argument(command: Command) -> Command {
        command.arg(Self::create_threshold_argument())
    }

    fn register_max_iterations_argument(command: Command) -> Command {
        command.arg(Self::create_max_iterations_argument())
    }

    fn register_sweep_argument(command: Command) -> Command {
        command.arg(Self::create_sweep_argument())
    }

    fn create_base_command() -> Command {
        Command::new(crate_name!())
            .version(crate_version!())
            .author(crate_authors!())
            .about(crate_description!())
    }

    fn create_input_file_argument() -> Arg {
        Arg::new("input_file")
            .help("Path to JPEG or PPM input file")
            .value_parser(value_parser!(PathBuf))
            .required(true)
    }

    fn create_output_file_argument() -> Arg {
        Arg::new("output_file")
            .help("Path to JPEG or PPM output file, or output directory when sweeping")
            .value_parser(value_parser!(PathBuf))
            .required(true)
    }

    fn create_rank_argument() -> Arg {
        arg!(rank: -k --rank <RANK> "Number of singular values, searched automatically if missing or not positive")
            .required(false)
            .allow_negative_numbers(true)
            .value_parser(value_parser!(i64))
    }

    fn create_verbose_argument() -> Arg {
        arg!(verbose: -v --verbose "Print compression metrics").action(ArgAction::SetTrue)
    }

    fn create_threads_argument() -> Arg {
        arg!(-t --threads <THREADS> "Number of Threads")
            .default_value(get_number_of_threads().unwrap_or(1).to_string())
            .required(false)
            .value_parser(value_parser!(usize))
    }

    fn create_threshold_argument() -> Arg {
        arg!(threshold: -e --threshold <THRESHOLD> "Error bound of the automatic rank search")
            .default_value(THRESHOLD.to_string())
            .required(false)
            .value_parser(value_parser!(f64))
    }

    fn create_max_iterations_argument() -> Arg {
        arg!(max_iterations: -m --max_iterations <ITERATIONS> "Iteration cap of the automatic rank search")
            .required(false)
            .value_parser(value_parser!(usize))
    }

    fn create_sweep_argument() -> Arg {
        arg!(sweep: -s --sweep <STEP> "Store compressions for every multiple of STEP below the maximal rank")
            .required(false)
            .value_parser(value_parser!(usize))
    }

    fn extract_arguments(matches: &ArgMatches) -> Arguments {
        Arguments {
            input_file: Self::extract_input_file_argument(matches),
            output_file: Self::extract_output_file_argument(matches),
            rank: Self::extract_rank_argument(matches),
            verbose: Self::extract_verbose_argument(matches),
            number_of_threads: Self::extract_threads_argument(matches),
            error_threshold: Self::extract_threshold_argument(matches),
            max_iterations: Self::extract_max_iterations_argument(matches),
            sweep_step: Self::extract_sweep_argument(matches),
        }
    }

    fn extract_input_file_argument(matches: &ArgMatches) -> PathBuf {
        matches
            .get_one::<PathBuf>("input_file")
            .expect("Required argument input_file not provided")
            .clone()
    }

    fn extract_output_file_argument(matches: &ArgMatches) -> PathBuf {
        matches
            .get_one::<PathBuf>("output_file")
            .expect("Required argument output_file not provided")
            .clone()
    }

    fn extract_rank_argument(matches: &ArgMatches) -> Option<usize> {
        matches
            .get_one::<i64>("rank")
            .filter(|rank| **rank > 0)
            .map(|rank| *rank as usize)
    }

    fn extract_verbose_argument(matches: &ArgMatches) -> bool {
        matches.get_flag("verbose")
    }

    fn extract_threads_argument(matches: &ArgMatches) -> usize {
        matches
            .get_one::<usize>("threads")
            .expect("Required argument threads not provided")
            .to_owned()
    }

    fn extract_threshold_argument(matches: &ArgMatches) -> f64 {
        matches
            .get_one::<f64>("threshold")
            .expect("Threshold must be provided, but was unset.")
            .to_owned()
    }

    fn extract_max_iterations_argument(matches: &ArgMatches) -> Option<usize> {
        matches.get_one::<usize>("max_iterations").copied()
    }

    fn extract_sweep_argument(matches: &ArgMatches) -> Option<usize> {
        matches.get_one::<usize>("sweep").copied()
    }
}

impl Default for CLIParser {
    fn default() -> Self {
        Self::new()
    }
}

fn get_number_of_threads() -> io::Result<usize> {
    Ok(thread::available_parallelism()?.get())
}
