//! Line-oriented interactive dashboard.
//!
//! Each input line is one command. Commands are handled one at a time against
//! the [`Simulator`]; add and remove print the route KPIs recomputed after the
//! action.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, warn};

use crate::analyzers::metrics::mean_duration;
use crate::analyzers::series::monthly_series;
use crate::map::{StationCoords, build_route_map};
use crate::normalize::normalize;
use crate::output::to_json;
use crate::parser::{parse_date, parse_time};
use crate::record::{RecordId, Route};
use crate::render;
use crate::simulator::{
    Action, Change, DURATION_RANGE, Impact, Simulator, SyntheticTrain, clamp_delay,
    clamp_duration,
};

/// Train types offered when adding a synthetic train.
pub const TRAIN_TYPES: [&str; 3] = ["TGV", "TER", "Intercités"];
const DEFAULT_TRAIN_TYPE: &str = "TGV";
const DEFAULT_DELAY_MINUTES: i64 = 10;

const HELP: &str = "\
Commands:
  routes                                   list destinations from the current origin
  select <origin> ; <destination>          change the selected route
  kpi                                      show the route KPIs
  chart                                    show the monthly charts
  trains                                   list records of the route with their ids
  map [file.geojson]                       show the routes from the origin, optionally export GeoJSON
  add <YYYY-MM-DD> <HH:MM> [type] [duration] [delay]
                                           add a synthetic train (type TGV|TER|Intercités,
                                           duration 10-600 min, delay 0-300 min)
  remove <id>                              remove a record of the route
  help                                     show this help
  quit                                     leave the dashboard
";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}', type 'help'")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("invalid {what}: '{value}'")]
    InvalidValue { what: &'static str, value: String },
}

/// Arguments of `add`. Omitted values take the session defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct AddArgs {
    pub date: NaiveDate,
    pub departure_time: NaiveTime,
    pub train_type: Option<String>,
    pub duration_minutes: Option<i64>,
    pub delay_minutes: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Routes,
    Select(Route),
    Kpi,
    Chart,
    Trains,
    Map(Option<PathBuf>),
    Add(AddArgs),
    Remove(RecordId),
    Help,
    Quit,
}

/// Matches a train type case-insensitively, with or without the accent.
fn train_type(raw: &str) -> Option<&'static str> {
    let fold = |s: &str| s.to_lowercase().replace('é', "e");
    let wanted = fold(raw);
    TRAIN_TYPES.into_iter().find(|t| fold(t) == wanted)
}

fn minutes(what: &'static str, raw: &str) -> Result<i64, CommandError> {
    raw.parse::<i64>().map_err(|_| CommandError::InvalidValue {
        what,
        value: raw.to_string(),
    })
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let args: Vec<&str> = rest.split_whitespace().collect();

        match name.to_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "routes" => Ok(Command::Routes),
            "kpi" => Ok(Command::Kpi),
            "chart" => Ok(Command::Chart),
            "trains" => Ok(Command::Trains),
            "help" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            "map" => Ok(Command::Map(args.first().map(PathBuf::from))),
            "select" => {
                let (origin, destination) = rest
                    .split_once(';')
                    .ok_or(CommandError::Usage("select <origin> ; <destination>"))?;
                let (origin, destination) = (origin.trim(), destination.trim());
                if origin.is_empty() || destination.is_empty() {
                    return Err(CommandError::Usage("select <origin> ; <destination>"));
                }
                Ok(Command::Select(Route::new(&normalize(origin), &normalize(destination))))
            }
            "remove" => {
                let [id] = args.as_slice() else {
                    return Err(CommandError::Usage("remove <id>"));
                };
                let id = id.parse::<u64>().map_err(|_| CommandError::InvalidValue {
                    what: "record id",
                    value: id.to_string(),
                })?;
                Ok(Command::Remove(RecordId(id)))
            }
            "add" => {
                const USAGE: &str = "add <YYYY-MM-DD> <HH:MM> [type] [duration] [delay]";
                if args.len() < 2 || args.len() > 5 {
                    return Err(CommandError::Usage(USAGE));
                }
                let date = parse_date(args[0]).ok_or_else(|| CommandError::InvalidValue {
                    what: "date",
                    value: args[0].to_string(),
                })?;
                let departure_time =
                    parse_time(args[1]).ok_or_else(|| CommandError::InvalidValue {
                        what: "departure time",
                        value: args[1].to_string(),
                    })?;
                let train_type = args
                    .get(2)
                    .map(|raw| {
                        train_type(raw).ok_or_else(|| CommandError::InvalidValue {
                            what: "train type",
                            value: raw.to_string(),
                        })
                    })
                    .transpose()?
                    .map(str::to_string);
                let duration_minutes = args.get(3).map(|raw| minutes("duration", raw)).transpose()?;
                let delay_minutes = args.get(4).map(|raw| minutes("delay", raw)).transpose()?;

                Ok(Command::Add(AddArgs {
                    date,
                    departure_time,
                    train_type,
                    duration_minutes,
                    delay_minutes,
                }))
            }
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Interactive dashboard state: the simulator plus display settings.
pub struct Session {
    simulator: Simulator,
    coords: StationCoords,
    json: bool,
}

impl Session {
    pub fn new(simulator: Simulator, coords: StationCoords, json: bool) -> Self {
        Self {
            simulator,
            coords,
            json,
        }
    }

    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    /// Fills the defaults of an `add` command and clamps values to the accepted ranges.
    pub fn synthetic_train(&self, args: AddArgs) -> SyntheticTrain {
        let route = self.simulator.route();
        let default_duration = mean_duration(self.simulator.dataset().route_records(route))
            .map(|d| d as i64)
            .unwrap_or(*DURATION_RANGE.start());

        SyntheticTrain {
            origin: route.origin.clone(),
            destination: route.destination.clone(),
            date: args.date,
            departure_time: args.departure_time,
            duration_minutes: clamp_duration(args.duration_minutes.unwrap_or(default_duration)),
            train_type: args
                .train_type
                .unwrap_or_else(|| DEFAULT_TRAIN_TYPE.to_string()),
            simulated_delay_minutes: clamp_delay(args.delay_minutes.unwrap_or(DEFAULT_DELAY_MINUTES)),
        }
    }

    fn write_metrics<W: Write>(&self, title: &str, out: &mut W) -> Result<()> {
        let metrics = self.simulator.metrics();
        if self.json {
            writeln!(out, "{}", to_json(&metrics)?)?;
        } else {
            write!(out, "{}", render::render_metrics(title, self.simulator.route(), &metrics))?;
        }
        Ok(())
    }

    fn write_chart<W: Write>(&self, out: &mut W) -> Result<()> {
        let route = self.simulator.route();
        let series = monthly_series(self.simulator.dataset().route_records(route));
        if self.json {
            writeln!(out, "{}", to_json(&series)?)?;
        } else {
            write!(out, "{}", render::render_chart(&series))?;
        }
        Ok(())
    }

    /// KPIs and charts of the selected route, shown on start and after `select`.
    pub fn overview<W: Write>(&self, out: &mut W) -> Result<()> {
        let route = self.simulator.route();
        let count = self.simulator.candidates().len();
        writeln!(out, "{count} record(s) available between {} and {}", route.origin, route.destination)?;
        if count == 0 {
            writeln!(out, "warning: no data available for this route")?;
            return Ok(());
        }
        self.write_metrics("Performance indicators", out)?;
        writeln!(out)?;
        self.write_chart(out)
    }

    fn write_map<W: Write>(&self, path: Option<PathBuf>, out: &mut W) -> Result<()> {
        let origin = &self.simulator.route().origin;
        let map = match build_route_map(self.simulator.dataset(), origin, &self.coords) {
            Ok(map) => map,
            Err(e) => {
                warn!(error = %e, "Map omitted");
                writeln!(out, "warning: {e}, map omitted")?;
                return Ok(());
            }
        };

        write!(out, "{}", render::render_map(&map))?;
        if let Some(path) = path {
            let geojson = serde_json::to_string_pretty(&map.to_geojson())?;
            std::fs::write(&path, geojson)
                .with_context(|| format!("failed to write map to {}", path.display()))?;
            writeln!(out, "Map written to {}", path.display())?;
        }
        Ok(())
    }

    fn run_action<W: Write>(&mut self, action: Action, out: &mut W) -> Result<()> {
        let before = self.simulator.metrics();
        let report = self.simulator.apply(action);

        match &report.outcome {
            Ok(Change::Added(id)) => writeln!(out, "Synthetic train added as record {id}.")?,
            Ok(Change::Removed(id, record)) => {
                writeln!(out, "Record {id} removed: {}", record.summary())?
            }
            Err(e) => writeln!(out, "warning: {e}")?,
        }

        if self.json {
            writeln!(out, "{}", to_json(&report.metrics)?)?;
        } else {
            write!(
                out,
                "{}",
                render::render_metrics("Impact after action", &report.route, &report.metrics)
            )?;
            write!(out, "{}", render::render_impact(&Impact::between(&before, &report.metrics)))?;
        }
        Ok(())
    }

    /// Handles one command.
    pub fn handle<W: Write>(&mut self, command: Command, out: &mut W) -> Result<Flow> {
        debug!(?command, "Handling command");

        match command {
            Command::Quit => return Ok(Flow::Quit),
            Command::Help => write!(out, "{HELP}")?,
            Command::Routes => {
                let origin = &self.simulator.route().origin;
                let destinations = self.simulator.dataset().destinations_from(origin);
                write!(out, "{}", render::render_routes(origin, &destinations))?;
                writeln!(out, "Origins: {}", self.simulator.dataset().origins().join(", "))?;
            }
            Command::Select(route) => {
                self.simulator.select(route);
                self.overview(out)?;
            }
            Command::Kpi => self.write_metrics("Performance indicators", out)?,
            Command::Chart => self.write_chart(out)?,
            Command::Trains => {
                let candidates = self.simulator.candidates();
                write!(out, "{}", render::render_trains(self.simulator.route(), &candidates))?;
            }
            Command::Map(path) => self.write_map(path, out)?,
            Command::Add(args) => {
                let train = self.synthetic_train(args);
                self.run_action(Action::Add(train), out)?;
            }
            Command::Remove(id) => self.run_action(Action::Remove(id), out)?,
        }

        Ok(Flow::Continue)
    }

    /// Reads commands line by line until `quit` or end of input. Invalid
    /// commands print a warning and the session goes on.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<()> {
        self.overview(out)?;

        for line in input.lines() {
            let line = line?;
            match line.parse::<Command>() {
                Ok(command) => {
                    if self.handle(command, out)? == Flow::Quit {
                        break;
                    }
                }
                Err(CommandError::Empty) => continue,
                Err(e) => writeln!(out, "warning: {e}")?,
            }
            out.flush()?;
        }

        Ok(())
    }
}
