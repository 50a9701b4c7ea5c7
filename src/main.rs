use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dhwani::assistant::{Listener, Speaker};
use dhwani::voice::{AudioCapture, AudioPlayback, AudioSpeaker, MicListener, calculate_energy};
use dhwani::{Assistant, Config, GoogleTranslator, preflight};

/// Dhwani - voice-driven banking FAQ assistant
#[derive(Parser)]
#[command(name = "dhwani", version, about)]
struct Cli {
    /// Config file (defaults to ~/.config/dhwani/config.toml)
    #[arg(short, long, env = "DHWANI_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Skip the check for ffmpeg/ffprobe on PATH
    #[arg(long)]
    skip_preflight: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
#[allow(clippy::enum_variant_names)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
        /// Language of the text
        #[arg(short, long, default_value = "en")]
        lang: String,
    },
    /// Answer a typed question aloud, without the microphone
    Ask {
        /// Question text
        question: String,
    },
    /// List the FAQ table
    Faq,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,dhwani=info",
        1 => "info,dhwani=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker().await,
            Command::TestTts { text, lang } => test_tts(&config, &text, &lang).await,
            Command::Ask { question } => ask(&config, &question).await,
            Command::Faq => list_faq(&config),
        };
    }

    if !cli.skip_preflight {
        match preflight::check_executables(&config.required_executables) {
            Ok(_) => {}
            Err(dhwani::Error::MissingExecutable(name)) => {
                println!("{}", preflight::missing_message(&name));
                anyhow::bail!("{name} is not found in PATH");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let faq = config.faq_table()?;
    let listener = MicListener::new(
        config.speech_to_text()?,
        config.conversation.pause,
        config.conversation.listen_timeout,
    )?;
    let speaker = AudioSpeaker::new(config.text_to_speech()?)?;
    let translator = GoogleTranslator::with_base_url(config.translation.endpoint.clone());

    tracing::info!(
        entries = faq.len(),
        stt = ?config.stt.provider,
        tts = ?config.tts.provider,
        "starting assistant"
    );

    let mut assistant =
        Assistant::new(faq, config.assistant_config(), listener, translator, speaker);
    assistant.run().await;

    Ok(())
}

/// Listener for `ask`: the question is typed, so there is nothing to hear
struct NoListener;

#[async_trait::async_trait(?Send)]
impl Listener for NoListener {
    async fn listen(&mut self) -> dhwani::Recognition {
        dhwani::Recognition::Unintelligible
    }
}

/// Answer one typed question
#[allow(clippy::future_not_send)]
async fn ask(config: &Config, question: &str) -> anyhow::Result<()> {
    let faq = config.faq_table()?;
    let speaker = AudioSpeaker::new(config.text_to_speech()?)?;
    let translator = GoogleTranslator::with_base_url(config.translation.endpoint.clone());

    let mut assistant =
        Assistant::new(faq, config.assistant_config(), NoListener, translator, speaker);
    let reply = assistant.handle_question(question).await;

    if reply.translated.is_none() {
        anyhow::bail!("translation failed");
    }

    Ok(())
}

/// Print the FAQ table
fn list_faq(config: &Config) -> anyhow::Result<()> {
    let faq = config.faq_table()?;

    for (i, entry) in faq.entries().iter().enumerate() {
        println!("{:2}. {}", i + 1, entry.question);
        println!("    {}", entry.answer);
    }
    println!("\n{} entries", faq.len());

    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_buffer()?;
        let energy = calculate_energy(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        // Visual meter
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak,
            meter
        );
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: pactl info | grep 'Default Source'");
    println!("  3. Run: arecord -l (to list devices)");

    Ok(())
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = AudioPlayback::new()?;

    let sample_rate = 24000_u32;
    let frequency = 440.0_f32;
    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..sample_rate * 2)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    println!("Playing {} samples at {} Hz...", samples.len(), sample_rate);

    playback.play(samples, sample_rate).await?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl info | grep 'Default Sink'");
    println!("  2. Run: pactl list sinks short");

    Ok(())
}

/// Test TTS output
#[allow(clippy::future_not_send)]
async fn test_tts(config: &Config, text: &str, lang: &str) -> anyhow::Result<()> {
    println!("Testing {:?} TTS with text: \"{text}\"\n", config.tts.provider);

    let mut speaker = AudioSpeaker::new(config.text_to_speech()?)?;
    speaker.speak(text, lang).await?;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}
