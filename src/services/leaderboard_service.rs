use crate::{
    dao::models::ScoreEntity, dto::leaderboard::LeaderboardEntry, error::ServiceError,
    state::SharedState,
};

/// Fastest scores, ranked from 1.
pub async fn top_scores(state: &SharedState) -> Result<Vec<LeaderboardEntry>, ServiceError> {
    let scores = state
        .play_store()
        .top_scores(state.config().leaderboard_size, None)
        .await?;

    Ok(scores
        .into_iter()
        .enumerate()
        .map(|(index, score)| LeaderboardEntry::new(index + 1, display_name(&score), score))
        .collect())
}

/// Username when set, otherwise the user id; wallet addresses are shortened.
pub fn display_name(score: &ScoreEntity) -> String {
    let name = score
        .username
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or(&score.user_id);
    shorten_address(name)
}

/// `0x04823b9e53F6...` becomes `0x0482...78ef`.
pub fn shorten_address(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    if !name.starts_with("0x") || chars.len() < 10 {
        return name.to_owned();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        state::AppState,
    };

    fn score(user_id: &str, username: Option<&str>, final_time_ms: u64) -> ScoreEntity {
        ScoreEntity {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            username: username.map(str::to_owned),
            final_time_ms,
            created_at: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn shortens_wallet_like_names_only() {
        assert_eq!(
            shorten_address("0x04823b9e53F6e921BcBf49737ed94aec3f2778ef"),
            "0x0482...78ef"
        );
        assert_eq!(shorten_address("0x12345678"), "0x1234...5678");
        assert_eq!(shorten_address("0x1234567"), "0x1234567");
        assert_eq!(shorten_address("neo"), "neo");
        assert_eq!(shorten_address("1x23456789abc"), "1x23456789abc");
    }

    #[test]
    fn falls_back_to_the_user_id() {
        let anonymous = score("0x04823b9e53F6e921BcBf49737ed94aec3f2778ef", None, 1);
        assert_eq!(display_name(&anonymous), "0x0482...78ef");
        let blank = score("0x04823b9e53F6e921BcBf49737ed94aec3f2778ef", Some(""), 1);
        assert_eq!(display_name(&blank), "0x0482...78ef");
        let named = score("0x1", Some("ada"), 1);
        assert_eq!(display_name(&named), "ada");
    }

    #[tokio::test]
    async fn ranks_by_ascending_time_and_caps_the_size() {
        let config = AppConfig {
            leaderboard_size: 2,
            ..AppConfig::default()
        };
        let state = AppState::in_memory(config);
        let store = state.play_store();
        store.insert_score(score("0xa", Some("slow"), 30_000)).await.unwrap();
        store.insert_score(score("0xb", Some("fast"), 10_000)).await.unwrap();
        store.insert_score(score("0xc", Some("mid"), 20_000)).await.unwrap();

        let board = top_scores(&state).await.unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!((board[0].rank, board[0].display_name.as_str()), (1, "fast"));
        assert_eq!((board[1].rank, board[1].display_name.as_str()), (2, "mid"));
        assert_eq!(board[0].created_at, "1970-01-01T00:00:00Z");
    }
}
