// SPDX: CC0-1.0

use anyhow::Context;
use chrono::{DateTime, Local};
use curve_plot::{
    shell::{self, Command},
    Equation, Graph, Number, Settings,
};
#[cfg(not(debug_assertions))]
use std::process::Stdio;
use std::{
    fs::OpenOptions,
    io::{stdout, BufWriter, Write},
    process::{self, Child, ExitCode},
};

const OUTPUT_RES: [u32; 2] = [1920, 1080];

fn output_filename(now: DateTime<Local>, extension: &str) -> String {
    format!(
        "{}_output-{}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
        extension
    )
}

fn main() -> ExitCode {
    env_logger::init();

    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("unexpected error: {err}");
            let chain = err.chain();
            if chain.len() > 1 {
                eprintln!();
                eprintln!("context:");
                for it in chain.skip(1) {
                    eprintln!("  {it}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug)]
struct Curve {
    source: String,
    equation: Equation,
    graph: Graph,
}

#[derive(Debug)]
struct State {
    curves: Vec<Curve>,
    settings: Settings,
    preview: bool,
    last_tick: DateTime<Local>,
    gnuplot: Option<Child>,
}

impl State {
    /// Advances every graph's reveal by the wall-clock time since the last
    /// tick.
    fn tick(&mut self, now: DateTime<Local>) {
        let elapsed = (now - self.last_tick)
            .to_std()
            .map(|d| d.as_secs_f32())
            .unwrap_or(0.0);
        self.last_tick = now;
        for curve in &mut self.curves {
            curve.graph.update(elapsed, &self.settings);
        }
    }
}

fn try_main() -> anyhow::Result<()> {
    let mut state = State {
        curves: Vec::new(),
        settings: Settings::default(),
        preview: false,
        last_tick: Local::now(),
        gnuplot: None,
    };

    let mut stdout = BufWriter::new(stdout());
    loop {
        writeln!(
            stdout,
            "{n} graph{s}, preview {preview}",
            n = state.curves.len(),
            s = if state.curves.len() == 1 { "" } else { "s" },
            preview = if state.preview { "on" } else { "off" },
        )?;

        let mut try_cmd = shell::input(&mut stdout, "> ")?;
        try_cmd.make_ascii_lowercase();
        writeln!(stdout)?;
        state.tick(Local::now());

        if let Ok(cmd) = try_cmd.parse::<Command>() {
            match cmd {
                Command::Help => {
                    for c in Command::exhaustive() {
                        writeln!(stdout, "{name}: {help}", name = c.name(), help = c.help())?;
                    }
                }

                Command::Quit => break,

                Command::Add => add_graph(&mut stdout, &mut state)?,

                Command::List => list_graphs(&mut stdout, &state)?,

                Command::Plot => plot_graphs(&mut stdout, &mut state)?,

                Command::Clear => {
                    log::info!("removing {} graphs", state.curves.len());
                    state.curves.clear();
                }

                Command::Preview => state.preview ^= true,

                Command::Settings => set_settings(&mut stdout, &mut state)?,

                Command::PrintProg => {
                    let sampler = state.curves.last().and_then(|c| c.graph.sampler());
                    if let Some(sampler) = sampler {
                        for (name, expr) in sampler.expressions() {
                            shell::dump_program(&mut stdout, name, expr)?;
                        }
                    } else {
                        shell::graph_undefined(&mut stdout)?;
                    }
                }
            }
        } else {
            writeln!(stdout, r#"Unknown command, try "help" for help"#)?;
        }

        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

fn add_graph<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let source = shell::input(&mut out, "graph = ")?;

    let result = Equation::parse_with(&source, &state.settings).and_then(|equation| {
        let mut graph = Graph::new(!state.preview);
        graph.generate(&equation, &state.settings)?;
        Ok((equation, graph))
    });

    match result {
        Ok((equation, graph)) => {
            log::info!(
                "added graph '{source}' with {} points",
                graph.points().len()
            );
            writeln!(
                out,
                "{equation} ({kind}), {n} points",
                kind = equation.kind(),
                n = graph.points().len()
            )?;
            state.curves.push(Curve {
                source,
                equation,
                graph,
            });
        }
        Err(err) => {
            log::warn!("rejected graph '{source}': {err}");
            shell::report(&mut out, &err)?;
        }
    }

    Ok(())
}

fn list_graphs<W: Write>(mut out: W, state: &State) -> anyhow::Result<()> {
    if state.curves.is_empty() {
        shell::graph_undefined(&mut out)?;
        return Ok(());
    }
    for (i, curve) in state.curves.iter().enumerate() {
        writeln!(
            out,
            "{i}: {source:?} -> {equation} ({kind}), {n} points, {progress:.0}% revealed",
            source = curve.source,
            equation = curve.equation,
            kind = curve.equation.kind(),
            n = curve.graph.points().len(),
            progress = curve.graph.progress() * 100.0,
        )?;
    }
    Ok(())
}

fn set_settings<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    writeln!(out, "settings = {:#}", state.settings)?;
    writeln!(out)?;
    writeln!(out, "note: leave blank to skip")?;

    let mut new = state.settings.clone();
    for (name, dst) in [
        ("step", &mut new.step),
        ("default domain min", &mut new.default_domain.start),
        ("default domain max", &mut new.default_domain.end),
    ] {
        match shell::read_fromstr::<_, Number>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
            true,
        )? {
            Ok(Some(val)) => *dst = val,
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }

    match shell::read_fromstr::<_, f32>(
        &mut out,
        format_args!(
            "?animation duration (is {cur}) = ",
            cur = new.animation_duration
        ),
        true,
    )? {
        Ok(Some(val)) => new.animation_duration = val,
        Ok(None) => {}
        Err(_) => return Ok(()),
    }

    match new.validate() {
        Ok(()) => {
            log::info!("settings changed to {new}");
            state.settings = new;
        }
        Err(err) => writeln!(out, "error: {err}")?,
    }

    Ok(())
}

fn plot_graphs<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    if state.curves.is_empty() {
        shell::graph_undefined(&mut out)?;
        return Ok(());
    }

    // one data block per graph that has anything drawable revealed
    let plotted: Vec<&Curve> = state
        .curves
        .iter()
        .filter(|curve| shell::is_plottable(curve.graph.visible_points()))
        .collect();
    if plotted.is_empty() {
        writeln!(out, "nothing is revealed yet, try again in a moment")?;
        return Ok(());
    }

    // set up gnuplot
    if let Some(mut old_child) = state.gnuplot.take() {
        old_child
            .kill()
            .context("failed to kill previous gnuplot child")?;
    }
    let now = Local::now();
    let data_path = output_filename(now, "data");
    let gnuplot_path = output_filename(now, "gnuplot");
    let svg_path = output_filename(now, "svg");
    let mut data = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&data_path)
            .context("failed to open output data file")?,
    );
    let mut gnuplot = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&gnuplot_path)
            .context("failed to open output gnuplot file")?,
    );

    for (i, curve) in plotted.iter().enumerate() {
        if i > 0 {
            writeln!(data)?;
            writeln!(data)?;
        }
        shell::write_data_block(&mut data, curve.graph.visible_points())?;
    }
    data.flush()
        .context("failed to write to output data file")?;
    data.get_mut().sync_data()?;
    drop(data);

    writeln!(gnuplot, "reset")?;
    writeln!(gnuplot, "set term push")?;
    // set output info
    let [width, height] = OUTPUT_RES;
    writeln!(gnuplot, "set terminal svg size {width},{height} enhanced")?;
    writeln!(gnuplot, "set output '{svg_path}'")?;

    // configure appearence
    writeln!(gnuplot, r#"set title "{data_path}""#)?;
    writeln!(gnuplot, "set title noenhanced")?;
    writeln!(gnuplot, "set size ratio -1")?;
    writeln!(gnuplot, "set grid")?;
    writeln!(gnuplot, "set xzeroaxis")?;
    writeln!(gnuplot, "set yzeroaxis")?;
    writeln!(gnuplot, r#"set xlabel "x""#)?;
    writeln!(gnuplot, r#"set ylabel "y""#)?;
    writeln!(gnuplot, "set tics out nomirror")?;
    writeln!(gnuplot, "set key out vertical top right")?;

    // sampled points have screen orientation, flip y back
    writeln!(gnuplot, "plot \\")?;
    for (i, curve) in plotted.iter().enumerate() {
        let sep = if i + 1 == plotted.len() { "" } else { ", \\" };
        writeln!(
            gnuplot,
            r#"  '{data_path}' index {i} using 1:(-$2) with lines lw 2 title "{title}" noenhanced{sep}"#,
            title = curve.source.replace('"', "'"),
        )?;
    }

    // display window
    writeln!(gnuplot, "set term pop")?;
    writeln!(gnuplot, "replot")?;

    // done with the file
    gnuplot.flush()?;
    gnuplot.get_mut().sync_data()?;
    drop(gnuplot);

    // spawn gnuplot and provide the path to the file
    let mut cmd = process::Command::new("gnuplot");
    cmd.arg("--persist").arg(&gnuplot_path);
    #[cfg(not(debug_assertions))]
    {
        cmd.stdout(Stdio::null())
            .stderr(Stdio::null())
            .stdin(Stdio::null());
    }
    let child = cmd
        .spawn()
        .context("failed to spawn gnuplot (is it installed and in ${{PATH}}?)")?;
    writeln!(out, "plotted {} graphs to '{svg_path}'", plotted.len())?;

    state.gnuplot = Some(child);

    Ok(())
}
