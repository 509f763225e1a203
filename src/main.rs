use anyhow::Result;
use clap::Parser;
use interview_coach::api::Artifact;
use interview_coach::capture::{
    CaptureDevices, RecognizerEvent, ScriptedRecognizer, SpeechRecognizer, StaticFaceDetector,
    SyntheticCameraFeed, UnavailableRecognizer,
};
use interview_coach::metrics::{BoundingBox, Clarity};
use interview_coach::{
    AnswerOutcome, Config, Difficulty, HttpInterviewApi, InputMode, InterviewApi,
    InterviewSession, SessionConfig, SessionReport, SessionState,
};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "interview-coach",
    about = "Practice interviews against the hosted question service"
)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// Role to interview for
    #[arg(short, long)]
    position: Option<String>,

    /// Job description text
    #[arg(short, long)]
    job_description: Option<String>,

    /// Question difficulty: easy, medium, or hard
    #[arg(short, long)]
    difficulty: Option<Difficulty>,

    /// Question category, repeatable (e.g. technical, behavioral)
    #[arg(short = 't', long = "question-type")]
    question_types: Vec<String>,

    /// Input mode: text, speech, or video
    #[arg(short, long)]
    mode: Option<InputMode>,

    /// Resume file to upload with the session
    #[arg(long)]
    resume: Option<PathBuf>,

    /// Job description file to upload instead of inline text
    #[arg(long)]
    jd_file: Option<PathBuf>,

    /// Replay a transcript file as dictated speech, one fragment per
    /// line (speech and video modes)
    #[arg(long)]
    script: Option<PathBuf>,

    /// List past interviews and exit
    #[arg(long)]
    list_past: bool,

    /// Show one past interview by id and exit
    #[arg(long)]
    show_past: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let api = Arc::new(HttpInterviewApi::new(config.api.clone())?);

    if args.list_past {
        return list_past(api.as_ref()).await;
    }
    if let Some(id) = &args.show_past {
        return show_past(api.as_ref(), id).await;
    }

    run_interview(args, config, api).await
}

async fn run_interview(args: Args, config: Config, api: Arc<HttpInterviewApi>) -> Result<()> {
    let input_mode = args.mode.unwrap_or(config.interview.input_mode);

    let mut session_config = SessionConfig {
        position: args.position.unwrap_or_else(|| config.interview.position.clone()),
        job_description: args
            .job_description
            .unwrap_or_else(|| config.interview.job_description.clone()),
        difficulty: args.difficulty.unwrap_or(config.interview.difficulty),
        question_types: if args.question_types.is_empty() {
            config.interview.question_types.clone()
        } else {
            args.question_types.clone()
        },
        input_mode,
        auto_submit: config.capture.auto_submit.clone(),
        ..SessionConfig::default()
    };

    if let Some(path) = &args.resume {
        let artifact = Artifact::load(path)?;
        info!(
            "Attaching resume: {} ({} bytes)",
            artifact.file_name,
            artifact.bytes.len()
        );
        session_config.resume = Some(artifact);
    }
    if let Some(path) = &args.jd_file {
        let artifact = Artifact::load(path)?;
        info!(
            "Attaching job description: {} ({} bytes)",
            artifact.file_name,
            artifact.bytes.len()
        );
        session_config.job_description_file = Some(artifact);
    }

    let devices = capture_devices(input_mode, &config, args.script.as_deref())?;
    let mut session = InterviewSession::new(session_config, api);

    if session.config().position.trim().is_empty() {
        println!("Starting interview (position taken from the resume)...");
    } else {
        println!("Starting interview for '{}'...", session.config().position);
    }
    session.start(devices).await?;

    for warning in session.warnings().await {
        println!("note: {}", warning);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while session.state() == SessionState::AwaitingAnswer {
        let question = session.current_question().unwrap_or_default().to_string();
        println!();
        println!("Q{}: {}", session.turns().len() + 1, question);
        print!("> ");
        std::io::stdout().flush()?;

        let outcome = match read_answer(&mut lines, &session).await? {
            AnswerSource::Typed(text) if text.trim().is_empty() => {
                println!("(empty answer, try again)");
                continue;
            }
            AnswerSource::Typed(text) => session.answer_with_text(&text).await,
            AnswerSource::AutoSubmit => {
                println!();
                println!("(silence detected, submitting captured answer)");
                session.submit_answer().await
            }
            AnswerSource::Eof => {
                println!();
                session.cancel().await?;
                break;
            }
        };

        match outcome {
            Ok(AnswerOutcome::NextQuestion(_)) => print_turn_metrics(&session).await,
            Ok(AnswerOutcome::Complete { .. }) => {
                print_turn_metrics(&session).await;
                println!();
                println!("Interview complete.");
            }
            Err(e) => println!("error: {e}"),
        }
    }

    if session.state() == SessionState::Complete && !session.turns().is_empty() {
        let report = session.report().await;
        print_report(&report);

        match session.fetch_feedback().await {
            Ok(feedback) => {
                println!();
                println!("Feedback: {feedback}");
            }
            Err(e) => info!("No overall feedback available: {}", e),
        }
    }

    Ok(())
}

enum AnswerSource {
    Typed(String),
    AutoSubmit,
    Eof,
}

async fn read_answer(
    lines: &mut Lines<BufReader<Stdin>>,
    session: &InterviewSession,
) -> Result<AnswerSource> {
    let auto_submit = session.capture().auto_submit_signal();

    tokio::select! {
        line = lines.next_line() => match line? {
            Some(text) => Ok(AnswerSource::Typed(text)),
            None => Ok(AnswerSource::Eof),
        },
        _ = auto_submit.notified() => Ok(AnswerSource::AutoSubmit),
    }
}

/// Wire up capture collaborators for the chosen mode.
///
/// No platform dictation or camera backend is integrated yet: speech
/// mode replays a transcript script when one is given and otherwise
/// degrades to typed input; video mode runs the synthetic feed so the
/// engagement pipeline is exercised end to end.
fn capture_devices(
    mode: InputMode,
    config: &Config,
    script: Option<&Path>,
) -> Result<CaptureDevices> {
    let devices = match mode {
        InputMode::Text => CaptureDevices::none(),
        InputMode::Speech => CaptureDevices::speech(transcript_recognizer(script)?),
        InputMode::Video => {
            info!("Using synthetic camera feed (no camera backend integrated)");
            let capture = &config.capture;
            let feed = SyntheticCameraFeed::new(
                capture.frame_width,
                capture.frame_height,
                capture.frame_interval(),
            );
            let face = BoundingBox {
                x: capture.frame_width as f32 / 2.0 - 60.0,
                y: capture.frame_height as f32 / 2.0 - 60.0,
                width: 120.0,
                height: 120.0,
            };
            CaptureDevices::video(
                transcript_recognizer(script)?,
                Box::new(feed),
                Box::new(StaticFaceDetector::always(face)),
            )
        }
    };
    Ok(devices)
}

/// Build a recognizer that replays `script` as dictation, one finalized
/// fragment per non-empty line. A long no-speech tail keeps the
/// recognition session open afterwards so the silence auto-submit
/// window can elapse.
fn transcript_recognizer(script: Option<&Path>) -> Result<Box<dyn SpeechRecognizer>> {
    let Some(path) = script else {
        return Ok(Box::new(UnavailableRecognizer));
    };

    let text = std::fs::read_to_string(path)?;
    let mut events: Vec<(Duration, RecognizerEvent)> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            (
                Duration::from_millis(1200),
                RecognizerEvent::Final(line.to_string()),
            )
        })
        .collect();
    info!(
        "Replaying transcript script {} ({} fragments)",
        path.display(),
        events.len()
    );
    events.push((Duration::from_secs(3600), RecognizerEvent::NoSpeech));
    Ok(Box::new(ScriptedRecognizer::new(events)))
}

async fn print_turn_metrics(session: &InterviewSession) {
    let Some(turn) = session.turns().last() else {
        return;
    };
    let speech = &turn.metrics.speech;
    println!(
        "  [pace {} wpm ({}), fillers {}, confidence {}]",
        speech.words_per_minute,
        Clarity::from_wpm(speech.words_per_minute),
        speech.filler_word_count,
        speech.confidence_score
    );

    let engagement = &turn.metrics.engagement;
    if engagement.engagement_score > 0 || engagement.dominant_emotion.is_some() {
        let emotion = engagement
            .dominant_emotion
            .map(|e| e.label.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  [eye contact {:.0}%, engagement {}, emotion {}]",
            engagement.eye_contact_ratio, engagement.engagement_score, emotion
        );
    }

    for hint in interview_coach::metrics::speech::coaching_hints(
        speech,
        turn.answered_at
            .signed_duration_since(turn.asked_at)
            .to_std()
            .unwrap_or_default(),
    ) {
        println!("  hint: {hint}");
    }
}

fn print_report(report: &SessionReport) {
    println!();
    println!("--- Interview report ---");
    println!("Position:           {} ({})", report.position, report.difficulty);
    println!(
        "Questions answered: {}/{}",
        report.questions_answered, report.questions_asked
    );
    println!("Duration:           {:.0}s", report.duration_secs);
    println!("Average pace:       {} wpm", report.average_wpm);
    println!("Filler words:       {}", report.total_filler_words);
    println!("Avg confidence:     {}", report.average_confidence);
    if report.engagement.engagement_score > 0 || report.engagement.looking_away_count > 0 {
        println!(
            "Eye contact:        {:.0}% (looked away {} times)",
            report.engagement.eye_contact_ratio, report.engagement.looking_away_count
        );
    }
    println!("Overall score:      {}", report.overall_score);
}

async fn list_past(api: &dyn InterviewApi) -> Result<()> {
    let interviews = api.past_interviews().await?;
    if interviews.is_empty() {
        println!("No past interviews recorded.");
        return Ok(());
    }

    for item in interviews {
        println!(
            "{}  {}  {}  {}  {} questions  {}  score {}",
            item.id,
            item.date.as_deref().unwrap_or("-"),
            item.position.as_deref().unwrap_or("-"),
            item.difficulty.as_deref().unwrap_or("-"),
            item.total_questions
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
            item.duration
                .map(|m| format!("{m:.0} min"))
                .unwrap_or_else(|| "-".to_string()),
            item.score
                .map(|s| format!("{s:.0}"))
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    Ok(())
}

async fn show_past(api: &dyn InterviewApi, id: &str) -> Result<()> {
    let record = api.past_interview(id).await?;

    println!(
        "Interview {} for {}",
        record.id,
        record.position.as_deref().unwrap_or("unknown position")
    );
    for (i, question) in record.questions.iter().enumerate() {
        println!();
        println!("Q{}: {}", i + 1, question);
        match record.answers.get(i) {
            Some(answer) => println!("A{}: {}", i + 1, answer),
            None => println!("A{}: (unanswered)", i + 1),
        }
    }
    if let Some(feedback) = &record.feedback {
        println!();
        println!("Feedback: {feedback}");
    }
    Ok(())
}
