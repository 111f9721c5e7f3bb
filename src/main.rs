use std::{env, fs, path::{Path, PathBuf}, process::ExitCode};
use log::info;
use wad_reader::{dump, geom, level::find_level, texture, Error, Level, Wad};

const USAGE: &str = "usage: wad_tool <archive.wad> [--level NAME] [--format json|json-verbose|dsl] [--textures-out DIR]";

enum Format {
	Json,
	JsonVerbose,
	Dsl,
}

struct Args {
	wad_path: PathBuf,
	level: Option<String>,
	format: Option<Format>,
	textures_out: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
	let mut wad_path = None;
	let mut level = None;
	let mut format = None;
	let mut textures_out = None;
	let mut args = env::args().skip(1);
	while let Some(arg) = args.next() {
		if arg == "--level" {
			level = Some(args.next().ok_or("--level needs a value")?);
		} else if arg == "--format" {
			let value = args.next().ok_or("--format needs a value")?;
			format = Some(match value.as_str() {
				"json" => Format::Json,
				"json-verbose" => Format::JsonVerbose,
				"dsl" => Format::Dsl,
				other => return Err(format!("unknown format: {other}")),
			});
		} else if arg == "--textures-out" {
			textures_out = Some(PathBuf::from(args.next().ok_or("--textures-out needs a value")?));
		} else if arg.starts_with("--") {
			return Err(format!("unknown option: {arg}"));
		} else if wad_path.is_none() {
			wad_path = Some(PathBuf::from(arg));
		} else {
			return Err(format!("unexpected argument: {arg}"));
		}
	}
	Ok(Args {
		wad_path: wad_path.ok_or("missing archive path")?,
		level,
		format,
		textures_out,
	})
}

fn run(args: &Args) -> wad_reader::Result<()> {
	let wad = Wad::open(&args.wad_path)?;
	let levels = wad.process();
	let selected: Vec<&Level> = match &args.level {
		Some(name) => vec![find_level(&levels, name)?],
		None => levels.iter().collect(),
	};
	for level in selected {
		process_level(&wad, level, args)?;
	}
	Ok(())
}

fn process_level(wad: &Wad, level: &Level, args: &Args) -> wad_reader::Result<()> {
	info!(
		"{}: {} vertices, {} linedefs, {} sidedefs, {} sectors, {} things",
		level.name,
		level.vertices.len(),
		level.linedefs.len(),
		level.sidedefs.len(),
		level.sectors.len(),
		level.things.len(),
	);
	let frame = geom::LevelFrame::new(&level.vertices);
	let groups = geom::build_level_geometry(level, &frame);
	let (num_vertices, num_indices) = groups.values().fold((0, 0), |(vertices, indices), group| {
		(vertices + group.vertices.len(), indices + group.indices.len())
	});
	info!(
		"{}: {} texture groups, {} vertices, {} triangles",
		level.name, groups.len(), num_vertices, num_indices / 3,
	);
	match geom::player_start_position(level, &frame) {
		Some(position) => info!("{}: player start at {}", level.name, position),
		None => info!("{}: no player start", level.name),
	}
	match args.format {
		Some(Format::Json) => print!("{}", dump::to_json(level)?),
		Some(Format::JsonVerbose) => println!("{}", dump::to_json_verbose(level)?),
		Some(Format::Dsl) => print!("{}", dump::to_dsl(level)),
		None => {}
	}
	if let Some(dir) = &args.textures_out {
		export_textures(wad, level, dir)?;
	}
	Ok(())
}

fn export_textures(wad: &Wad, level: &Level, dir: &Path) -> wad_reader::Result<()> {
	fs::create_dir_all(dir)?;
	let bank = texture::build_level_textures(wad, level);
	for (name, raster) in bank.iter() {
		let path = dir.join(format!("{}_{}.png", level.name, name));
		image::save_buffer(&path, &raster.data, raster.width, raster.height, image::ColorType::Rgba8)
			.map_err(|error| Error::Format(format!("{}: {}", path.display(), error)))?;
	}
	info!("{}: wrote {} textures to {}", level.name, bank.len(), dir.display());
	Ok(())
}

fn main() -> ExitCode {
	env_logger::init();
	let args = match parse_args() {
		Ok(args) => args,
		Err(message) => {
			eprintln!("{message}");
			eprintln!("{USAGE}");
			return ExitCode::FAILURE;
		}
	};
	match run(&args) {
		Ok(()) => ExitCode::SUCCESS,
		Err(error) => {
			eprintln!("{error}");
			ExitCode::FAILURE
		}
	}
}
