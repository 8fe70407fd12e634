//! Staged reward reveal.
//!
//! Stages only ever move forward. Each stage adds facts to what is already
//! visible; nothing is hidden again until the sequencer is dropped.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;

use kidquest_domain::{Badge, Cosmetic, RewardCeremony};

use super::scheduler::TimerScheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealStage {
    /// Quest title and "Quest complete"
    Headline,
    Xp,
    Coins,
    /// Badges, level-up, totals and the continue button
    Summary,
}

/// When each stage appears, measured from the start of the reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealTimeline {
    pub xp: Duration,
    pub confetti: Duration,
    pub coins: Duration,
    pub summary: Duration,
}

impl Default for RevealTimeline {
    fn default() -> Self {
        Self {
            xp: Duration::from_millis(1000),
            confetti: Duration::from_millis(1500),
            coins: Duration::from_millis(2500),
            summary: Duration::from_millis(4000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealProgress {
    pub stage: RevealStage,
    pub confetti: bool,
    disposed: bool,
}

/// Exactly the facts visible at the current stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevealView {
    pub stage: RevealStage,
    pub quest_title: String,
    pub confetti: bool,
    pub xp_earned: Option<u32>,
    pub coins_earned: Option<u32>,
    pub badges: Vec<Badge>,
    pub cosmetics: Vec<Cosmetic>,
    pub new_level: Option<u32>,
    pub total_xp: Option<u32>,
    pub total_coins: Option<u32>,
    pub can_continue: bool,
}

pub struct RewardSequencer {
    ceremony: RewardCeremony,
    progress: watch::Sender<RevealProgress>,
    scheduler: TimerScheduler,
}

impl RewardSequencer {
    /// Show the headline now and schedule the rest. Needs a tokio runtime.
    pub fn start(ceremony: RewardCeremony, timeline: RevealTimeline) -> Self {
        let (progress, _) = watch::channel(RevealProgress {
            stage: RevealStage::Headline,
            confetti: false,
            disposed: false,
        });
        let mut scheduler = TimerScheduler::new();

        for (delay, stage) in [
            (timeline.xp, RevealStage::Xp),
            (timeline.coins, RevealStage::Coins),
            (timeline.summary, RevealStage::Summary),
        ] {
            let tx = progress.clone();
            scheduler.schedule(delay, move || advance(&tx, stage));
        }
        let tx = progress.clone();
        scheduler.schedule(timeline.confetti, move || {
            tx.send_if_modified(|p| {
                if p.disposed || p.confetti {
                    return false;
                }
                p.confetti = true;
                true
            });
        });

        tracing::debug!(quest = %ceremony.quest_title, "Reward reveal started");
        Self {
            ceremony,
            progress,
            scheduler,
        }
    }

    pub fn ceremony(&self) -> &RewardCeremony {
        &self.ceremony
    }

    pub fn stage(&self) -> RevealStage {
        self.progress.borrow().stage
    }

    pub fn is_finished(&self) -> bool {
        self.stage() == RevealStage::Summary
    }

    /// Watch stage changes.
    pub fn subscribe(&self) -> watch::Receiver<RevealProgress> {
        self.progress.subscribe()
    }

    pub fn view(&self) -> RevealView {
        let progress = *self.progress.borrow();
        let stage = progress.stage;
        let c = &self.ceremony;
        let summary = stage >= RevealStage::Summary;
        RevealView {
            stage,
            quest_title: c.quest_title.clone(),
            confetti: progress.confetti,
            xp_earned: (stage >= RevealStage::Xp).then_some(c.xp_earned),
            coins_earned: (stage >= RevealStage::Coins).then_some(c.coins_earned),
            badges: if summary { c.badges_unlocked.clone() } else { Vec::new() },
            cosmetics: if summary { c.cosmetics_unlocked.clone() } else { Vec::new() },
            new_level: if summary { c.new_level } else { None },
            total_xp: summary.then_some(c.total_xp),
            total_coins: summary.then_some(c.total_coins),
            can_continue: summary,
        }
    }

    /// Cancel pending stages. The view stays frozen where it was.
    pub fn dispose(&mut self) {
        self.progress.send_modify(|p| p.disposed = true);
        self.scheduler.cancel_all();
    }
}

impl Drop for RewardSequencer {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn advance(tx: &watch::Sender<RevealProgress>, stage: RevealStage) {
    tx.send_if_modified(|p| {
        if p.disposed || stage <= p.stage {
            return false;
        }
        p.stage = stage;
        true
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use kidquest_domain::{BadgeId, Subject};

    fn ceremony(badges: Vec<Badge>) -> RewardCeremony {
        RewardCeremony {
            quest_title: "Number Adventure".to_string(),
            xp_earned: 50,
            coins_earned: 20,
            badges_unlocked: badges,
            cosmetics_unlocked: vec![],
            new_level: Some(2),
            total_xp: 150,
            total_coins: 70,
        }
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn stages_are_revealed_in_order() {
        let badge = Badge::for_quest(BadgeId::new("badge_math_counting"), "Number Adventure", Subject::Math);
        let sequencer = RewardSequencer::start(ceremony(vec![badge]), RevealTimeline::default());

        let view = sequencer.view();
        assert_eq!(view.stage, RevealStage::Headline);
        assert_eq!(view.xp_earned, None);

        sleep_ms(1001).await;
        assert_eq!(sequencer.view().xp_earned, Some(50));
        assert_eq!(sequencer.view().coins_earned, None);
        assert!(!sequencer.view().confetti);

        sleep_ms(500).await;
        assert!(sequencer.view().confetti);

        sleep_ms(1000).await;
        let view = sequencer.view();
        assert_eq!(view.coins_earned, Some(20));
        assert!(view.badges.is_empty());

        sleep_ms(1500).await;
        let view = sequencer.view();
        assert_eq!(view.stage, RevealStage::Summary);
        assert_eq!(view.badges.len(), 1);
        assert_eq!(view.new_level, Some(2));
        assert!(view.can_continue);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_before_summary_hides_it_for_good() {
        let mut sequencer = RewardSequencer::start(ceremony(vec![]), RevealTimeline::default());
        let rx = sequencer.subscribe();

        sleep_ms(3000).await;
        assert_eq!(sequencer.stage(), RevealStage::Coins);

        sequencer.dispose();
        sleep_ms(10_000).await;

        let view = sequencer.view();
        assert_eq!(view.stage, RevealStage::Coins);
        assert_eq!(view.total_xp, None);
        assert!(!view.can_continue);
        assert_eq!(rx.borrow().stage, RevealStage::Coins);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_timeline_is_honoured() {
        let timeline = RevealTimeline {
            xp: Duration::from_millis(10),
            confetti: Duration::from_millis(10),
            coins: Duration::from_millis(20),
            summary: Duration::from_millis(30),
        };
        let sequencer = RewardSequencer::start(ceremony(vec![]), timeline);
        sleep_ms(31).await;
        assert!(sequencer.is_finished());
    }
}
