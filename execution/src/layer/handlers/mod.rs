use super::*;

fn wager_error(player: &PublicKey, play_id: Option<Digest>, error: &WagerError) -> Event {
    debug!(code = error.code(), %error, "wager instruction rejected");
    Event::WagerFailed {
        player: player.clone(),
        play_id,
        error_code: error.code(),
        message: error.to_string(),
    }
}

fn wager_error_vec(player: &PublicKey, play_id: Option<Digest>, error: &WagerError) -> Vec<Event> {
    vec![wager_error(player, play_id, error)]
}

mod wager;
