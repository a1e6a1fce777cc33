//! Dice animation CLI - Pack, inspect and preview animation data sets.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::Path;
use std::process;

use dice_anim::{
    animation::{AnimationKind, AnimationPreset, AnimationSimple, PlaybackContext},
    bits::{AnimationBits, RgbKeyframe, palette_from_color32},
    dataset::{DataSet, DataSetSummary},
    preview::PreviewPlayer,
    profile::{Action, Condition, FaceCompareFlags, Rule},
    schema::PreviewConfig,
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("--example") => print_example(),
        Some("pack") if args.len() == 4 => pack(&args[2], &args[3]),
        Some("inspect") if args.len() == 3 => inspect(&args[2]),
        Some("preview") if args.len() == 4 || args.len() == 5 => {
            preview(&args[2], &args[3], args.get(4).map(String::as_str))
        }
        _ => {
            usage(&args[0]);
            process::exit(1);
        }
    }
}

fn usage(program: &str) {
    eprintln!("Usage: {program} <command> [arguments]");
    eprintln!();
    eprintln!("Pack, inspect and preview dice LED animation data sets.");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  pack <dataset.json> <out.bin>              Validate and pack a data set");
    eprintln!("  inspect <dataset.json|packed.bin>          Print sizes, hash and contents");
    eprintln!("  preview <dataset.json> <index> [config]    Print frames of one animation");
    eprintln!();
    eprintln!("Example data set and preview configuration are generated with --example flag.");
}

/// Print `context` and the error, then exit.
fn fail(context: &str, e: impl std::fmt::Display) -> ! {
    eprintln!("Error {context}: {e}");
    process::exit(1);
}

fn load_data_set(path: &str) -> DataSet {
    let data_set = DataSet::load_json(path).unwrap_or_else(|e| fail("loading data set", e));
    data_set
        .validate()
        .unwrap_or_else(|e| fail("validating data set", e));
    data_set
}

/// Write the summary followed by the payload, the order a die receives them.
fn pack(input: &str, output: &str) {
    let data_set = load_data_set(input);
    let payload = data_set
        .serialize()
        .unwrap_or_else(|e| fail("packing data set", e));
    let summary = data_set
        .summary_for(&payload)
        .unwrap_or_else(|e| fail("packing data set", e));

    let mut bytes = Vec::with_capacity(DataSetSummary::SIZE + payload.len());
    summary
        .write_to(&mut bytes)
        .unwrap_or_else(|e| fail("writing summary", e));
    bytes.extend_from_slice(&payload);
    fs::write(output, &bytes).unwrap_or_else(|e| fail("writing output", e));

    println!("Packed {} -> {}", input, output);
    print_summary(&summary);
}

fn inspect(path: &str) {
    let is_json = Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let (data_set, summary) = if is_json {
        let data_set = load_data_set(path);
        let summary = data_set
            .summary()
            .unwrap_or_else(|e| fail("packing data set", e));
        (data_set, summary)
    } else {
        let bytes = fs::read(path).unwrap_or_else(|e| fail("reading packed file", e));
        if bytes.len() < DataSetSummary::SIZE {
            fail("reading packed file", "shorter than the summary header");
        }
        let (mut header, payload) = bytes.split_at(DataSetSummary::SIZE);
        let summary = DataSetSummary::read_from(&mut header)
            .unwrap_or_else(|e| fail("reading summary", e));
        let data_set =
            DataSet::decode(&summary, payload).unwrap_or_else(|e| fail("decoding payload", e));
        (data_set, summary)
    };

    print_summary(&summary);
    println!();
    println!("Animations:");
    for (i, preset) in data_set.animations.iter().enumerate() {
        println!(
            "  [{i}] {:?}, {} ms, {} bytes",
            preset.animation_type(),
            preset.duration_ms,
            preset.size()
        );
    }
    println!("Rules:");
    for rule in &data_set.rules {
        let condition = data_set.conditions.get(rule.condition_index as usize);
        let actions = data_set.actions.get(rule.action_range()).unwrap_or_default();
        println!("  {condition:?} -> {actions:?}");
    }
}

fn print_summary(summary: &DataSetSummary) {
    let b = &summary.bits;
    println!("Data set");
    println!("========");
    println!("Size: {} bytes", summary.total_size);
    println!("Hash: {:#010x}", summary.hash);
    println!(
        "Bits: {} colors, {} rgb keyframes, {} rgb tracks, {} keyframes, {} tracks",
        b.palette, b.rgb_keyframes, b.rgb_tracks, b.keyframes, b.tracks
    );
    println!(
        "Animations: {} ({} bytes)",
        summary.animation_count, summary.animations_size
    );
    println!(
        "Conditions: {} ({} bytes)",
        summary.condition_count, summary.conditions_size
    );
    println!("Actions: {}", summary.action_count);
    println!("Rules: {}", summary.rule_count);
}

fn preview(path: &str, index: &str, config_path: Option<&str>) {
    let data_set = load_data_set(path);
    let index: usize = index
        .parse()
        .unwrap_or_else(|e| fail("parsing animation index", e));
    let preset = data_set
        .animations
        .get(index)
        .unwrap_or_else(|| fail("selecting animation", format!("no animation {index}")));

    let config = match config_path {
        Some(config_path) => {
            let config_str = fs::read_to_string(config_path)
                .unwrap_or_else(|e| fail("reading config file", e));
            serde_json::from_str::<PreviewConfig>(&config_str)
                .unwrap_or_else(|e| fail("parsing config", e))
        }
        None => PreviewConfig::default(),
    };
    config
        .validate()
        .unwrap_or_else(|e| fail("validating config", e));

    let die = config.make_die();
    let ctx = PlaybackContext::new(&data_set.bits, &die, &data_set.animations);
    let mut player =
        PreviewPlayer::new(preset, ctx, &config).unwrap_or_else(|e| fail("creating instance", e));

    println!(
        "Animation {index}: {:?}, {} ms on a {:?} at {} fps",
        preset.animation_type(),
        player.end_ms(),
        config.die_type,
        config.fps
    );
    for frame in player.frames() {
        let frame = frame.unwrap_or_else(|e| fail("rendering frame", e));
        println!("{frame}");
    }
}

fn print_example() {
    let mut bits = AnimationBits {
        palette: palette_from_color32(&[0xFF0000, 0x00FF00, 0x0000FF]),
        ..Default::default()
    };
    bits.push_rgb_track(
        &[
            RgbKeyframe::new(0, 0),
            RgbKeyframe::new(500, 1),
            RgbKeyframe::new(1000, 2),
        ],
        0xFFFFF,
    );
    let flash = AnimationPreset::new(
        1000,
        AnimationKind::Simple(AnimationSimple {
            face_mask: 0xFFFFF,
            color_index: 0,
            count: 2,
            fade: 64,
        }),
    );
    let data_set = DataSet::new(
        bits,
        vec![flash],
        vec![Condition::FaceCompare {
            face_index: 19,
            flags: FaceCompareFlags {
                equal: true,
                ..Default::default()
            },
        }],
        vec![Action::PlayAnimation {
            animation_index: 0,
            face_index: 19,
            loop_count: 1,
        }],
        vec![Rule {
            condition_index: 0,
            action_offset: 0,
            action_count: 1,
        }],
    );
    let config = PreviewConfig {
        seed: Some(42),
        ..Default::default()
    };

    println!("Example data set (dataset.json):");
    println!(
        "{}",
        data_set
            .to_json_string()
            .unwrap_or_else(|e| fail("encoding example", e))
    );
    println!();
    println!("Example preview configuration (preview.json):");
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|e| fail("encoding example", e))
    );
}
