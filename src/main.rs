use std::env;
use std::fmt::Display;
use std::fs;
use std::io::{self, Read};
use std::process;
use getopts::Options;
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use descent::grammars::{calc, json, Sample};
use descent::{report, BuildError};

fn main() {
  let args = env::args().collect::<Vec<_>>();
  let prog = args[0].clone();
  let mut opts = Options::new();
  opts.optopt("g", "grammar",
    "Grammar to parse with. Defaults to json.\n\
      Supported grammars: json, calc",
    "NAME");
  opts.optopt("r", "rule", "Rule to start from. Defaults to the grammar's entry rule", "RULE");
  opts.optflag("d", "dump", "Print the recorded grammar and exit");
  opts.optflag("v", "verbose", "Log recovery decisions to stderr");
  opts.optflag("h", "help", "Print this message");

  let matches = match opts.parse(&args[1..]) {
    Ok(m) => m,
    Err(err) => {
      eprintln!("{}", err);
      process::exit(1);
    }
  };

  if matches.opt_present("h") {
    print_usage(prog, opts);
    return;
  }

  init_logger(matches.opt_present("v"));

  let path = match matches.free.len() {
    0 => None,
    1 => Some(matches.free[0].clone()),
    _ => {
      print_usage(prog, opts);
      process::exit(1);
    }
  };

  let cmd = Command {
    rule: matches.opt_str("r"),
    dump: matches.opt_present("d"),
    path,
  };

  let status = match matches.opt_str("g").as_deref().unwrap_or("json") {
    "json" => cmd.run(json::sample()),
    "calc" => cmd.run(calc::sample()),
    other => {
      eprintln!("unknown grammar: {}", other);
      1
    }
  };

  process::exit(status);
}

struct Command {
  rule: Option<String>,
  dump: bool,
  path: Option<String>,
}

impl Command {
  fn run<V: Default + Display>(&self, sample: Result<Sample<V>, BuildError>) -> i32 {
    let sample = match sample {
      Ok(sample) => sample,
      Err(err) => {
        eprintln!("cannot build grammar: {}", err);
        return 1;
      }
    };

    if self.dump {
      let language = &sample.language;
      print!("{}", language.grammar().display(language.vocabulary()));
      return 0;
    }

    let input = match self.read_input() {
      Ok(input) => input,
      Err(err) => {
        eprintln!("cannot read input: {}", err);
        return 1;
      }
    };

    let rule = self.rule.as_deref().unwrap_or(sample.default_rule);
    let outcome = sample.run_rule(rule, &input);
    let path = self.path.as_deref().unwrap_or("<stdin>");
    eprint!("{}", report::report(path, &input, &outcome.lex_errors, &outcome.output));

    match outcome.output.value {
      Some(value) => {
        println!("{}", value);
        0
      }
      None => 1,
    }
  }

  fn read_input(&self) -> io::Result<String> {
    match &self.path {
      Some(path) => fs::read_to_string(path),
      None => {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input)?;
        Ok(input)
      }
    }
  }
}

/// `DESCENT_LOG` overrides the level picked by `-v`.
fn init_logger(verbose: bool) {
  let level = env::var("DESCENT_LOG").ok()
    .and_then(|level| level.parse::<LevelFilter>().ok())
    .unwrap_or(if verbose { LevelFilter::Debug } else { LevelFilter::Warn });

  let config = ConfigBuilder::new()
    .set_time_format_custom(&[])
    .build();

  if let Err(err) = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Never) {
    eprintln!("cannot initialize logger: {}", err);
  }
}

fn print_usage(prog: String, opts: Options) {
  let brief = format!("Usage: {} [options] [PATH]", prog);
  print!("{}", opts.usage(&brief));
}
