use clap::{value_parser, Arg, ArgAction, Command};
use crossfill::backtracking_search::{FillFailure, FillOptions};
use crossfill::grid_config::GridConfig;
use crossfill::word_list::WordList;
use crossfill::{render_grid, solve_with_options};
use instant::{Duration, Instant};
use std::error::Error;
use std::fs;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let matches = Command::new("crossfill")
        .about("Fill a crossword structure with words from a word list")
        .arg(
            Arg::new("structure")
                .required(true)
                .help("Grid template: one row per line, `_` for open cells and `#` for blocks"),
        )
        .arg(
            Arg::new("words")
                .required(true)
                .help("Word list with one word per line"),
        )
        .arg(Arg::new("output").help("Also write the filled grid to this file"))
        .arg(
            Arg::new("no-inference")
                .long("no-inference")
                .action(ArgAction::SetTrue)
                .help("Don't re-establish arc consistency after each choice"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECONDS")
                .value_parser(value_parser!(u64))
                .help("Give up after this many seconds"),
        )
        .get_matches();

    let structure_path = matches
        .get_one::<String>("structure")
        .expect("structure is required");
    let words_path = matches
        .get_one::<String>("words")
        .expect("words is required");

    let config = GridConfig::from_template_string(&fs::read_to_string(structure_path)?)?;
    let word_list = WordList::parse(&fs::read_to_string(words_path)?)?;

    let options = FillOptions {
        inference: !matches.get_flag("no-inference"),
        deadline: matches
            .get_one::<u64>("timeout")
            .map(|&seconds| Instant::now() + Duration::from_secs(seconds)),
    };

    match solve_with_options(&config, &word_list, &options) {
        Ok(result) => {
            let display_grid = render_grid(&config, &word_list, &result.assignment);

            println!("{:?}", result.statistics);
            println!("{}", display_grid);

            if let Some(output_path) = matches.get_one::<String>("output") {
                fs::write(output_path, display_grid + "\n")?;
                println!("written file to {}", output_path);
            }
        }
        Err(FillFailure::HardFailure) => println!("No solution."),
        Err(FillFailure::Timeout) => println!("Timed out."),
    }

    Ok(())
}
