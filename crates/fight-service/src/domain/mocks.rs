use async_trait::async_trait;
use fight_core::{Post, VoteKey};
use mockall::mock;

use super::{AchievementUnlock, Caller};
use crate::infra::backend::{BetReceipt, Character, Error, GeekFightsApi};

mock! {
    pub Api {}
    #[async_trait]
    impl GeekFightsApi for Api {
        async fn get_post(&self, post_id: &str, caller: &Caller) -> Result<Post, Error>;
        async fn submit_fight_vote(&self, post_id: &str, choice: &VoteKey, caller: &Caller) -> Result<(), Error>;
        async fn place_bet(&self, post_id: &str, prediction: &VoteKey, amount: u64, caller: &Caller) -> Result<BetReceipt, Error>;
        async fn get_characters(&self) -> Result<Vec<Character>, Error>;
        async fn unlock_achievement(&self, unlock: &AchievementUnlock) -> Result<(), Error>;
    }
}
