use anyhow::{Result, bail};
use clap::Parser;
use log::{info, warn};
use siano::{
    Args, EngineConfig, HostMsg, Player, StdinPitchSource, display_name, import_midi_file,
    list_midi_library, pitch_name,
};

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if let Some(dir) = args.library.as_ref() {
        let files = list_midi_library(dir)?;
        info!("{} MIDI file(s) in '{}'..!", files.len(), dir.display());
        for file in files.iter() {
            println!("{:30} {}", display_name(file), file.display());
        }
        return Ok(());
    }

    let Some(midi) = args.midi.as_ref() else {
        bail!("No MIDI file given..!")
    };

    info!("Importing MIDI file: '{}'...", midi.display());
    let timeline = import_midi_file(midi)?;

    if timeline.is_empty() {
        bail!("No notes found in '{}'..!", midi.display());
    }

    if args.dry_run {
        info!("Previewing at most {} chord groups..!", args.dry_run_max);
        for (i, group) in timeline.groups().iter().take(args.dry_run_max).enumerate() {
            let names: Vec<String> = group.notes().iter().map(|n| pitch_name(n.pitch)).collect();
            info!(
                "Group {}: tick={} notes=[{}]",
                i,
                group.start_tick(),
                names.join(" ")
            );
        }
        return Ok(());
    }

    let mut player = Player::new(EngineConfig::from(&args), args.frame_rate, args.verbose);
    player.load_timeline(timeline);

    let stop_tx = player.sender();
    ctrlc::set_handler(move || {
        warn!("Ctrl-C received, stopping practice..!");
        let _ = stop_tx.send(HostMsg::Stop);
    })?;

    info!("Play the highlighted keys (MIDI number, note name or frequency, one per line)..!");
    let summary = player.play(StdinPitchSource::new())?;

    info!(
        "Cleared {} chord group(s): {} correct, {} incorrect, {} free play{}",
        summary.groups_cleared,
        summary.correct,
        summary.incorrect,
        summary.free_play,
        if summary.finished { ", piece complete!" } else { "" }
    );

    Ok(())
}
