use std::sync::Arc;

use rollcall::prelude::*;

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

const TEACHER: &str = "teacher-key";
const STUDENTS: [(&str, &str); 3] = [
    ("ana-key", "ana"),
    ("ben-key", "ben"),
    ("chen-key", "chen"),
];

type Classroom = Rollcall<MemoryIdentityStore, MemoryStore, MemoryStore>;

/// Reads `ROLLCALL_CONFIG` (a path to a JSON file) if set.
fn load_config() -> Result<RollcallConfig, Box<dyn std::error::Error>> {
    match std::env::var("ROLLCALL_CONFIG") {
        Ok(path) => Ok(RollcallConfig::from_json(&std::fs::read_to_string(path)?)?),
        Err(_) => Ok(RollcallConfig::default()),
    }
}

fn classroom(config: RollcallConfig) -> Classroom {
    let mut identities =
        MemoryIdentityStore::new().with_identity(TEACHER, Identity::coordinator("teacher"));
    for (credential, name) in STUDENTS {
        identities = identities.with_identity(credential, Identity::participant(name));
    }
    let store = Arc::new(MemoryStore::new());
    RollcallBuilder::new()
        .config(config)
        .build(Arc::new(identities), Arc::clone(&store), store)
}

async fn scan(
    room: &Classroom,
    credential: &str,
    token: &str,
) -> Result<Outcome, RollcallError> {
    let outcome = room
        .present_token(credential, token, &Provenance::new("192.168.1.20", "classroom-demo"))
        .await?;
    println!("{credential:>9}: {}", outcome.message());
    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Walkthrough
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    rollcall::init_tracing();
    let room = classroom(load_config()?);

    let session = room
        .create_session(TEACHER, "Intro to Systems", AttendanceKind::CheckIn)
        .await?;
    let arrival = session.current_token().unwrap_or_default().to_string();
    tracing::info!(session_id = %session.id, "displaying arrival code");
    println!("QR code: {arrival}");

    for (credential, _) in STUDENTS.iter().take(2) {
        scan(&room, credential, &arrival).await?;
    }
    // Scanning twice is refused, not an error.
    scan(&room, "ana-key", &arrival).await?;

    let exit = room
        .regenerate_token_as(TEACHER, &session.id, AttendanceKind::CheckOut)
        .await?;
    let departure = exit.current_token().unwrap_or_default().to_string();
    println!("QR code: {departure}");

    scan(&room, "ana-key", &departure).await?;
    scan(&room, "chen-key", &departure).await?;
    // The arrival code was replaced by the departure code.
    scan(&room, "ben-key", &arrival).await?;

    room.deactivate_session(TEACHER, &session.id).await?;
    scan(&room, "ben-key", &departure).await?;

    let roster = room.session_attendance(TEACHER, &session.id).await?;
    println!("{}", serde_json::to_string_pretty(&roster)?);
    Ok(())
}
