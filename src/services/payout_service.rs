use std::time::SystemTime;

use time::{Date, Duration, OffsetDateTime, Time, macros::format_description};
use tracing::{error, info};

use crate::{
    config::Economy,
    dao::play_store::TimeRange,
    dto::payout::{PayoutLine, PayoutReport},
    error::ServiceError,
    payments::TransferRequest,
    state::{SharedState, clock::ms_to_system_time},
};

/// Pay today's fastest players from today's entry fees.
pub async fn run_daily_payout(state: &SharedState) -> Result<PayoutReport, ServiceError> {
    let now = ms_to_system_time(state.clock().now_ms());
    payout_for_day(state, OffsetDateTime::from(now).date()).await
}

/// Pay the fastest players of `day` (UTC) from that day's entry fees.
///
/// Transfers run one after the other; the first refusal aborts the batch.
pub async fn payout_for_day(state: &SharedState, day: Date) -> Result<PayoutReport, ServiceError> {
    let economy = &state.config().economy;
    let range = utc_day_range(day);
    let store = state.play_store();

    let plays_started = store.count_plays_started(range).await?;
    let pool_cents = plays_started * economy.entry_fee_cents;
    let distributable_cents = pool_cents * economy.payout_pool_percent / 100;
    let shares = prize_shares(distributable_cents, economy);

    let mut report = PayoutReport {
        day: format_day(day),
        plays_started,
        pool_cents,
        distributable_cents,
        payouts: Vec::new(),
    };

    if distributable_cents == 0 {
        info!(day = %report.day, plays_started, "nothing to distribute");
        return Ok(report);
    }

    let winners = store.top_scores(shares.len(), Some(range)).await?;
    if winners.is_empty() {
        info!(day = %report.day, plays_started, "no scores today; nothing distributed");
        return Ok(report);
    }

    let payments = state.payments();
    for (index, (score, amount_cents)) in winners.into_iter().zip(shares).enumerate() {
        if amount_cents == 0 {
            continue;
        }
        let rank = index + 1;
        let receipt = payments
            .transfer(TransferRequest {
                from: economy.treasury_address.clone(),
                to: score.user_id.clone(),
                amount_cents,
            })
            .await
            .inspect_err(|err| {
                error!(
                    day = %report.day,
                    rank,
                    user_id = %score.user_id,
                    settled = report.payouts.len(),
                    error = %err,
                    "payout aborted"
                )
            })?;
        info!(day = %report.day, rank, user_id = %score.user_id, amount_cents, tx_hash = %receipt.tx_hash, "prize paid");
        report.payouts.push(PayoutLine {
            rank,
            user_id: score.user_id,
            final_time_ms: score.final_time_ms,
            amount_cents,
            tx_hash: receipt.tx_hash,
        });
    }

    Ok(report)
}

/// Prize per rank, best time first, in whole cents.
pub fn prize_shares(distributable_cents: u64, economy: &Economy) -> Vec<u64> {
    economy
        .payout_splits_percent
        .iter()
        .map(|percent| distributable_cents * percent / 100)
        .collect()
}

/// `[00:00, next 00:00)` of `day` in UTC.
pub fn utc_day_range(day: Date) -> TimeRange {
    let start = day.with_time(Time::MIDNIGHT).assume_utc();
    let end = start + Duration::DAY;
    (SystemTime::from(start), SystemTime::from(end))
}

fn format_day(day: Date) -> String {
    day.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| day.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::macros::date;
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{PlayEntity, ScoreEntity},
            play_store::{PlayStore, memory::MemoryPlayStore},
        },
        payments::ledger::MemoryLedger,
        state::{AppState, clock::ManualClock},
    };

    const DAY: Date = date!(2024 - 03 - 10);

    fn noon() -> SystemTime {
        SystemTime::from(DAY.with_time(Time::from_hms(12, 0, 0).unwrap()).assume_utc())
    }

    fn state() -> (SharedState, MemoryPlayStore, MemoryLedger) {
        let store = MemoryPlayStore::new();
        let ledger = MemoryLedger::new();
        let state = AppState::new(
            AppConfig::default(),
            Arc::new(store.clone()),
            Arc::new(ledger.clone()),
            Arc::new(ManualClock::new(0)),
        );
        (state, store, ledger)
    }

    async fn seed_plays(store: &MemoryPlayStore, count: usize, started: SystemTime) {
        for _ in 0..count {
            let play = PlayEntity::new("0xplayer".into(), started);
            let id = play.id;
            store.create_play(play).await.unwrap();
            store.record_play_start(id, started).await.unwrap();
        }
    }

    async fn seed_score(store: &MemoryPlayStore, user_id: &str, final_time_ms: u64, at: SystemTime) {
        store
            .insert_score(ScoreEntity {
                id: Uuid::new_v4(),
                user_id: user_id.into(),
                username: None,
                final_time_ms,
                created_at: at,
            })
            .await
            .unwrap();
    }

    #[test]
    fn splits_eighty_percent_of_the_pool() {
        let economy = Economy::default();
        let pool = 10 * economy.entry_fee_cents;
        let distributable = pool * economy.payout_pool_percent / 100;
        assert_eq!(distributable, 800);
        assert_eq!(prize_shares(distributable, &economy), vec![400, 240, 160]);
        assert_eq!(prize_shares(1, &economy), vec![0, 0, 0]);
    }

    #[test]
    fn day_range_spans_utc_midnights() {
        let (start, end) = utc_day_range(DAY);
        assert_eq!(
            OffsetDateTime::from(start),
            DAY.with_time(Time::MIDNIGHT).assume_utc()
        );
        assert_eq!(end.duration_since(start).unwrap().as_secs(), 86_400);
    }

    #[tokio::test]
    async fn pays_the_top_three_of_the_day() {
        let (state, store, ledger) = state();
        seed_plays(&store, 10, noon()).await;
        seed_plays(&store, 4, noon() - std::time::Duration::from_secs(86_400)).await;
        seed_score(&store, "0xsecond", 20_000, noon()).await;
        seed_score(&store, "0xfirst", 10_000, noon()).await;
        seed_score(&store, "0xthird", 30_000, noon()).await;
        seed_score(&store, "0xfourth", 40_000, noon()).await;
        seed_score(&store, "0xyesterday", 1_000, noon() - std::time::Duration::from_secs(86_400)).await;

        let report = payout_for_day(&state, DAY).await.unwrap();
        assert_eq!(report.day, "2024-03-10");
        assert_eq!(report.plays_started, 10);
        assert_eq!(report.pool_cents, 1_000);
        assert_eq!(report.distributable_cents, 800);
        let paid: Vec<_> = report
            .payouts
            .iter()
            .map(|line| (line.user_id.as_str(), line.amount_cents))
            .collect();
        assert_eq!(paid, [("0xfirst", 400), ("0xsecond", 240), ("0xthird", 160)]);

        let entries = ledger.entries().await;
        assert_eq!(entries.len(), 3);
        assert!(
            entries
                .iter()
                .all(|entry| entry.request.from == state.config().economy.treasury_address)
        );
    }

    #[tokio::test]
    async fn last_second_counts_and_next_midnight_does_not() {
        let (state, store, _) = state();
        let (_, next_midnight) = utc_day_range(DAY);
        seed_plays(&store, 1, next_midnight - std::time::Duration::from_millis(500)).await;
        seed_plays(&store, 1, next_midnight).await;

        let report = payout_for_day(&state, DAY).await.unwrap();
        assert_eq!(report.plays_started, 1);
        let report = payout_for_day(&state, DAY.next_day().unwrap()).await.unwrap();
        assert_eq!(report.plays_started, 1);
    }

    #[tokio::test]
    async fn nothing_is_paid_without_scores_or_plays() {
        let (state, store, ledger) = state();
        let report = payout_for_day(&state, DAY).await.unwrap();
        assert!(report.payouts.is_empty());

        seed_plays(&store, 3, noon()).await;
        let report = payout_for_day(&state, DAY).await.unwrap();
        assert_eq!(report.distributable_cents, 240);
        assert!(report.payouts.is_empty());
        assert!(ledger.entries().await.is_empty());
    }

    #[tokio::test]
    async fn a_refused_transfer_aborts_the_batch() {
        let (state, store, ledger) = state();
        seed_plays(&store, 10, noon()).await;
        seed_score(&store, "0xfirst", 10_000, noon()).await;
        seed_score(&store, "0xsecond", 20_000, noon()).await;
        seed_score(&store, "0xthird", 30_000, noon()).await;
        ledger.refuse_after(1).await;

        let err = payout_for_day(&state, DAY).await.unwrap_err();
        assert!(matches!(err, ServiceError::PaymentFailed(_)));
        assert_eq!(ledger.entries().await.len(), 1);
    }
}
