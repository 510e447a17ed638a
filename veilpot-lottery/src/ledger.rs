//! The confidential lottery ledger.
//!
//! Every state-changing call runs inside one SQLite transaction that also
//! holds the ciphertexts and grants it produces. Returning early with an
//! error drops the transaction, so a failed call leaves nothing behind.

use crate::config::LotteryConfig;
use crate::draw::{self, score_ticket, Draw, DrawStore};
use crate::events::{self, EventLog, EventRecord, LedgerEvent};
use crate::points::{self, PointsStore};
use crate::randomness::{CoprocessorRandomness, RandomnessSource};
use crate::ticket::{self, Ticket, TicketStore};
use crate::{LotteryError, Result};
use rusqlite::{params, Connection};
use std::sync::Arc;
use uuid::Uuid;
use veilpot_core::{
    Address, Amount, Coprocessor, Encrypted, EncryptedInput, Euint32, Euint8, Handle, InputProof,
    Storage,
};

/// Exact value `buy_ticket` must carry: 0.01 of a whole unit.
pub const TICKET_PRICE: Amount = Amount::from_base_units(10_000_000_000_000_000);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS ledger_state (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        balance TEXT NOT NULL
    );
    INSERT OR IGNORE INTO ledger_state (id, balance) VALUES (1, '0');
";

/// Who is calling and what value they attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub sender: Address,
    pub value: Amount,
}

impl CallContext {
    pub fn new(sender: Address, value: Amount) -> Self {
        Self { sender, value }
    }

    /// A call carrying no value.
    pub fn without_value(sender: Address) -> Self {
        Self::new(sender, Amount::ZERO)
    }
}

pub struct LotteryLedger {
    contract: Address,
    coprocessor: Arc<Coprocessor>,
    randomness: Box<dyn RandomnessSource>,
}

impl LotteryLedger {
    /// Open the ledger described by `config`, drawing with the coprocessor RNG.
    pub async fn open(config: &LotteryConfig) -> Result<Self> {
        let randomness = CoprocessorRandomness::new(config.draw_range);
        Self::with_randomness(config, Box::new(randomness)).await
    }

    pub async fn with_randomness(
        config: &LotteryConfig,
        randomness: Box<dyn RandomnessSource>,
    ) -> Result<Self> {
        config.validate()?;

        let storage = match &config.db_path {
            Some(path) => Storage::new(path).await?,
            None => Storage::in_memory().await?,
        };

        for schema in [
            ticket::SCHEMA,
            points::SCHEMA,
            draw::SCHEMA,
            events::SCHEMA,
            SCHEMA,
        ] {
            storage.apply_schema(schema).await?;
        }

        let coprocessor = Coprocessor::from_passphrase(
            &config.coprocessor.passphrase,
            config.coprocessor.kdf_iterations,
            Arc::new(storage),
        )?;

        tracing::info!("Lottery ledger opened for contract {}", config.contract_address);

        Ok(Self {
            contract: config.contract_address,
            coprocessor: Arc::new(coprocessor),
            randomness,
        })
    }

    pub fn contract_address(&self) -> Address {
        self.contract
    }

    pub fn coprocessor(&self) -> &Arc<Coprocessor> {
        &self.coprocessor
    }

    pub fn ticket_price(&self) -> Amount {
        TICKET_PRICE
    }

    /// Start building encrypted inputs from `user` for this ledger.
    pub fn input(&self, user: Address) -> EncryptedInput {
        EncryptedInput::new(self.contract, user)
    }

    /// Buy a ticket holding two encrypted numbers.
    ///
    /// Numbers outside the draw range are accepted; they can never match.
    pub async fn buy_ticket(
        &self,
        ctx: &CallContext,
        first: Handle,
        second: Handle,
        proof: &InputProof,
    ) -> Result<LedgerEvent> {
        let tx_id = Uuid::new_v4();

        match self.try_buy_ticket(tx_id, ctx, first, second, proof).await {
            Ok(event) => {
                tracing::info!("Ticket purchased by {} (tx {})", ctx.sender, tx_id);
                Ok(event)
            }
            Err(e) => {
                tracing::warn!("Rejected ticket purchase by {} (tx {}): {}", ctx.sender, tx_id, e);
                Err(e)
            }
        }
    }

    async fn try_buy_ticket(
        &self,
        tx_id: Uuid,
        ctx: &CallContext,
        first: Handle,
        second: Handle,
        proof: &InputProof,
    ) -> Result<LedgerEvent> {
        if ctx.value != TICKET_PRICE {
            return Err(LotteryError::InvalidPayment {
                expected: TICKET_PRICE,
                got: ctx.value,
            });
        }

        let mut conn = self.coprocessor.storage().get_connection().await;
        let tx = conn.transaction()?;

        let event = {
            let tickets = TicketStore::new(&tx);
            if matches!(tickets.get(&ctx.sender)?, Some(ticket) if ticket.active) {
                return Err(LotteryError::TicketAlreadyActive(ctx.sender));
            }

            let session = self.coprocessor.session(&tx, self.contract);
            let first: Euint8 = session.from_external(first, proof, &ctx.sender)?;
            let second: Euint8 = session.from_external(second, proof, &ctx.sender)?;
            session.allow(first, &ctx.sender)?;
            session.allow(second, &ctx.sender)?;

            tickets.put(&Ticket {
                owner: ctx.sender,
                first,
                second,
                active: true,
            })?;
            credit(&tx, ctx.value)?;

            let event = LedgerEvent::TicketPurchased {
                player: ctx.sender,
                first,
                second,
            };
            EventLog::new(&tx).append(tx_id, &event)?;

            tracing::debug!(
                "Ticket for {} holds {} and {}",
                ctx.sender,
                first.handle().short(),
                second.handle().short()
            );
            event
        };

        tx.commit()?;
        Ok(event)
    }

    /// Score the caller's active ticket against a fresh encrypted draw.
    pub async fn draw(&self, ctx: &CallContext) -> Result<LedgerEvent> {
        let tx_id = Uuid::new_v4();

        match self.try_draw(tx_id, ctx).await {
            Ok(event) => {
                tracing::info!("Draw completed for {} (tx {})", ctx.sender, tx_id);
                Ok(event)
            }
            Err(e) => {
                tracing::warn!("Rejected draw by {} (tx {}): {}", ctx.sender, tx_id, e);
                Err(e)
            }
        }
    }

    async fn try_draw(&self, tx_id: Uuid, ctx: &CallContext) -> Result<LedgerEvent> {
        if ctx.value != Amount::ZERO {
            return Err(LotteryError::InvalidPayment {
                expected: Amount::ZERO,
                got: ctx.value,
            });
        }

        let mut conn = self.coprocessor.storage().get_connection().await;
        let tx = conn.transaction()?;

        let event = {
            let tickets = TicketStore::new(&tx);
            let ticket = match tickets.get(&ctx.sender)? {
                Some(ticket) if ticket.active => ticket,
                _ => return Err(LotteryError::NoActiveTicket(ctx.sender)),
            };

            let session = self.coprocessor.session(&tx, self.contract);
            let drawn = self.randomness.draw_pair(&session)?;
            let reward = score_ticket(&session, &ticket, &drawn)?;

            // An unset balance reads as zero
            let points = PointsStore::new(&tx);
            let balance = session.add(points.get(&ctx.sender)?, reward)?;
            points.put(&ctx.sender, balance)?;

            tickets.deactivate(&ctx.sender)?;
            DrawStore::new(&tx).put(&ctx.sender, &drawn)?;

            session.allow(drawn.first, &ctx.sender)?;
            session.allow(drawn.second, &ctx.sender)?;
            session.allow(reward, &ctx.sender)?;
            session.allow(balance, &ctx.sender)?;

            let event = LedgerEvent::DrawCompleted {
                player: ctx.sender,
                random_first: drawn.first,
                random_second: drawn.second,
                reward,
            };
            EventLog::new(&tx).append(tx_id, &event)?;

            tracing::debug!(
                "Draw for {} rewarded {}, points now {}",
                ctx.sender,
                reward.handle().short(),
                balance.handle().short()
            );
            event
        };

        tx.commit()?;
        Ok(event)
    }

    /// The caller's ticket, or an inactive ticket with uninitialized numbers.
    pub async fn get_ticket(&self, owner: &Address) -> Result<Ticket> {
        let conn = self.coprocessor.storage().get_connection().await;
        let ticket = TicketStore::new(&conn).get(owner)?;
        Ok(ticket.unwrap_or_else(|| Ticket::empty(*owner)))
    }

    pub async fn get_points(&self, owner: &Address) -> Result<Euint32> {
        let conn = self.coprocessor.storage().get_connection().await;
        PointsStore::new(&conn).get(owner)
    }

    /// Pair drawn by the owner's most recent draw, if any.
    pub async fn get_last_draw(&self, owner: &Address) -> Result<Option<Draw>> {
        let conn = self.coprocessor.storage().get_connection().await;
        DrawStore::new(&conn).get(owner)
    }

    /// Ticket revenue held by the ledger.
    pub async fn balance(&self) -> Result<Amount> {
        let conn = self.coprocessor.storage().get_connection().await;
        load_balance(&conn)
    }

    pub async fn events(&self, player: &Address) -> Result<Vec<EventRecord>> {
        let conn = self.coprocessor.storage().get_connection().await;
        EventLog::new(&conn).for_player(player)
    }

    /// Decrypt `value` for `user`. Both `user` and the ledger must hold a grant.
    pub async fn user_decrypt<T: Encrypted>(&self, value: T, user: &Address) -> Result<T::Clear> {
        Ok(self
            .coprocessor
            .user_decrypt(value, user, &self.contract)
            .await?)
    }
}

impl std::fmt::Debug for LotteryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LotteryLedger")
            .field("contract", &self.contract)
            .finish_non_exhaustive()
    }
}

fn load_balance(conn: &Connection) -> Result<Amount> {
    let raw: String = conn.query_row("SELECT balance FROM ledger_state WHERE id = 1", [], |row| {
        row.get(0)
    })?;
    Amount::parse_units(&raw)
        .map_err(|e| LotteryError::internal(format!("Corrupt ledger balance '{}': {}", raw, e)))
}

fn credit(conn: &Connection, value: Amount) -> Result<()> {
    let balance = load_balance(conn)?
        .checked_add(value)
        .ok_or_else(|| LotteryError::internal("Ledger balance overflow"))?;
    conn.execute(
        "UPDATE ledger_state SET balance = ?1 WHERE id = 1",
        params![balance.to_string()],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::randomness::FixedRandomness;
    use crate::{JACKPOT_REWARD, SINGLE_MATCH_REWARD};
    use tempfile::tempdir;
    use veilpot_core::storage::CiphertextStore;
    use veilpot_core::FheSession;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    fn test_config() -> LotteryConfig {
        let mut config = LotteryConfig::new(Address::random());
        config.coprocessor.kdf_iterations = 10;
        config
    }

    async fn scripted(pairs: impl IntoIterator<Item = (u8, u8)>) -> LotteryLedger {
        init_tracing();
        LotteryLedger::with_randomness(&test_config(), Box::new(FixedRandomness::new(pairs)))
            .await
            .unwrap()
    }

    async fn buy_with(
        ledger: &LotteryLedger,
        player: Address,
        numbers: (u8, u8),
        value: Amount,
    ) -> Result<LedgerEvent> {
        let inputs = ledger
            .input(player)
            .add8(numbers.0)
            .add8(numbers.1)
            .encrypt(ledger.coprocessor())
            .await?;
        ledger
            .buy_ticket(
                &CallContext::new(player, value),
                inputs.handles[0],
                inputs.handles[1],
                &inputs.proof,
            )
            .await
    }

    async fn buy(ledger: &LotteryLedger, player: Address, numbers: (u8, u8)) -> Result<LedgerEvent> {
        buy_with(ledger, player, numbers, TICKET_PRICE).await
    }

    async fn ciphertext_count(ledger: &LotteryLedger) -> u64 {
        let conn = ledger.coprocessor().storage().get_connection().await;
        CiphertextStore::new(&conn).count().unwrap()
    }

    #[test]
    fn test_ticket_price_is_one_hundredth() {
        assert_eq!(TICKET_PRICE, Amount::parse_units("0.01").unwrap());
        assert_eq!(TICKET_PRICE.to_string(), "0.01");
    }

    #[tokio::test]
    async fn test_fresh_address_reads_zero_points() -> anyhow::Result<()> {
        let ledger = scripted([]).await;
        let alice = Address::random();

        let points = ledger.get_points(&alice).await?;
        assert!(!points.is_initialized());
        assert_eq!(ledger.user_decrypt(points, &alice).await?, 0);

        let ticket = ledger.get_ticket(&alice).await?;
        assert!(!ticket.active);
        assert!(ledger.get_last_draw(&alice).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_payment_must_be_exact() {
        let ledger = scripted([]).await;
        let alice = Address::random();

        for value in ["0.009", "0.011", "0"] {
            let value = Amount::parse_units(value).unwrap();
            let err = buy_with(&ledger, alice, (4, 12), value).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Payment, "value {}", value);
        }

        assert!(!ledger.get_ticket(&alice).await.unwrap().active);
        assert_eq!(ledger.balance().await.unwrap(), Amount::ZERO);
        assert!(ledger.events(&alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_buy_then_jackpot_draw() -> anyhow::Result<()> {
        let ledger = scripted([(12, 4)]).await;
        let alice = Address::random();

        let event = buy(&ledger, alice, (4, 12)).await?;
        let ticket = ledger.get_ticket(&alice).await?;
        assert!(ticket.active);
        assert_eq!(
            event,
            LedgerEvent::TicketPurchased {
                player: alice,
                first: ticket.first,
                second: ticket.second,
            }
        );
        assert_eq!(ledger.user_decrypt(ticket.first, &alice).await?, 4);
        assert_eq!(ledger.user_decrypt(ticket.second, &alice).await?, 12);
        assert_eq!(ledger.balance().await?, TICKET_PRICE);

        let event = ledger.draw(&CallContext::without_value(alice)).await?;
        let LedgerEvent::DrawCompleted {
            random_first,
            random_second,
            reward,
            ..
        } = event
        else {
            panic!("expected a draw event, got {:?}", event);
        };

        assert_eq!(ledger.user_decrypt(reward, &alice).await?, JACKPOT_REWARD);
        assert_eq!(ledger.user_decrypt(random_first, &alice).await?, 12);
        assert_eq!(ledger.user_decrypt(random_second, &alice).await?, 4);

        let points = ledger.get_points(&alice).await?;
        assert_eq!(ledger.user_decrypt(points, &alice).await?, JACKPOT_REWARD);

        let last = ledger.get_last_draw(&alice).await?.unwrap();
        assert_eq!(last.first, random_first);
        assert_eq!(last.second, random_second);
        assert!(!ledger.get_ticket(&alice).await?.active);
        assert_eq!(ledger.events(&alice).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_second_purchase_while_active_fails() {
        let ledger = scripted([]).await;
        let alice = Address::random();

        buy(&ledger, alice, (1, 2)).await.unwrap();
        let before = ledger.get_ticket(&alice).await.unwrap();

        let err = buy(&ledger, alice, (3, 4)).await.unwrap_err();
        assert!(matches!(err, LotteryError::TicketAlreadyActive(addr) if addr == alice));
        assert_eq!(err.kind(), ErrorKind::State);

        assert_eq!(ledger.get_ticket(&alice).await.unwrap(), before);
        assert_eq!(ledger.balance().await.unwrap(), TICKET_PRICE);
    }

    #[tokio::test]
    async fn test_draw_without_ticket_fails() {
        let ledger = scripted([(1, 1)]).await;
        let bob = Address::random();

        let err = ledger.draw(&CallContext::without_value(bob)).await.unwrap_err();
        assert!(matches!(err, LotteryError::NoActiveTicket(addr) if addr == bob));
        assert_eq!(err.kind(), ErrorKind::State);
    }

    #[tokio::test]
    async fn test_second_draw_after_one_purchase_fails() {
        let ledger = scripted([(5, 6), (5, 6)]).await;
        let alice = Address::random();

        buy(&ledger, alice, (5, 9)).await.unwrap();
        let ctx = CallContext::without_value(alice);
        ledger.draw(&ctx).await.unwrap();

        let points = ledger.get_points(&alice).await.unwrap();
        let err = ledger.draw(&ctx).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
        assert_eq!(ledger.get_points(&alice).await.unwrap(), points);
    }

    #[tokio::test]
    async fn test_rewards_accumulate_across_rounds() -> anyhow::Result<()> {
        let ledger = scripted([(4, 9), (7, 7), (1, 2)]).await;
        let alice = Address::random();
        let ctx = CallContext::without_value(alice);

        // One match
        buy(&ledger, alice, (4, 4)).await?;
        ledger.draw(&ctx).await?;
        // Duplicate number against a doubled draw
        buy(&ledger, alice, (7, 7)).await?;
        ledger.draw(&ctx).await?;
        // Miss
        buy(&ledger, alice, (19, 20)).await?;
        ledger.draw(&ctx).await?;

        let points = ledger.get_points(&alice).await?;
        assert_eq!(
            ledger.user_decrypt(points, &alice).await?,
            SINGLE_MATCH_REWARD + JACKPOT_REWARD
        );
        assert_eq!(
            ledger.balance().await?,
            Amount::parse_units("0.03")?
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_out_of_range_numbers_never_match() -> anyhow::Result<()> {
        let ledger = scripted([(1, 20)]).await;
        let alice = Address::random();

        buy(&ledger, alice, (0, 200)).await?;
        let event = ledger.draw(&CallContext::without_value(alice)).await?;
        let LedgerEvent::DrawCompleted { reward, .. } = event else {
            panic!("expected a draw event");
        };
        assert_eq!(ledger.user_decrypt(reward, &alice).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_proof_is_bound_to_caller() {
        let ledger = scripted([]).await;
        let alice = Address::random();
        let mallory = Address::random();

        let inputs = ledger
            .input(alice)
            .add8(3)
            .add8(8)
            .encrypt(ledger.coprocessor())
            .await
            .unwrap();

        let err = ledger
            .buy_ticket(
                &CallContext::new(mallory, TICKET_PRICE),
                inputs.handles[0],
                inputs.handles[1],
                &inputs.proof,
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Proof);
        assert!(!ledger.get_ticket(&mallory).await.unwrap().active);
        assert_eq!(ledger.balance().await.unwrap(), Amount::ZERO);
    }

    #[tokio::test]
    async fn test_input_for_other_ledger_is_rejected() {
        let ledger = scripted([]).await;
        let alice = Address::random();

        let inputs = EncryptedInput::new(Address::random(), alice)
            .add8(3)
            .add8(8)
            .encrypt(ledger.coprocessor())
            .await
            .unwrap();

        let err = ledger
            .buy_ticket(
                &CallContext::new(alice, TICKET_PRICE),
                inputs.handles[0],
                inputs.handles[1],
                &inputs.proof,
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Proof);
    }

    #[tokio::test]
    async fn test_wrong_input_type_is_rejected() {
        let ledger = scripted([]).await;
        let alice = Address::random();

        let inputs = ledger
            .input(alice)
            .add32(3)
            .add8(8)
            .encrypt(ledger.coprocessor())
            .await
            .unwrap();

        let err = ledger
            .buy_ticket(
                &CallContext::new(alice, TICKET_PRICE),
                inputs.handles[0],
                inputs.handles[1],
                &inputs.proof,
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Proof);
    }

    struct FailingRandomness;

    impl RandomnessSource for FailingRandomness {
        fn draw_pair(&self, session: &FheSession<'_>) -> Result<Draw> {
            // Leave a ciphertext behind before failing
            session.trivial::<Euint8>(9)?;
            Err(LotteryError::internal("randomness unavailable"))
        }
    }

    #[tokio::test]
    async fn test_failed_draw_rolls_back_everything() {
        init_tracing();
        let ledger = LotteryLedger::with_randomness(&test_config(), Box::new(FailingRandomness))
            .await
            .unwrap();
        let alice = Address::random();

        buy(&ledger, alice, (2, 3)).await.unwrap();
        let ciphertexts = ciphertext_count(&ledger).await;

        let err = ledger.draw(&CallContext::without_value(alice)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);

        assert_eq!(ciphertext_count(&ledger).await, ciphertexts);
        assert!(ledger.get_ticket(&alice).await.unwrap().active);
        assert!(!ledger.get_points(&alice).await.unwrap().is_initialized());
        assert!(ledger.get_last_draw(&alice).await.unwrap().is_none());
        assert_eq!(ledger.events(&alice).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_draw_rejects_attached_value() {
        let ledger = scripted([(1, 2)]).await;
        let alice = Address::random();

        buy(&ledger, alice, (1, 2)).await.unwrap();
        let err = ledger
            .draw(&CallContext::new(alice, TICKET_PRICE))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Payment);
        assert!(ledger.get_ticket(&alice).await.unwrap().active);
    }

    #[tokio::test]
    async fn test_every_new_ciphertext_is_granted() -> anyhow::Result<()> {
        let ledger = scripted([(6, 11)]).await;
        let contract = ledger.contract_address();
        let alice = Address::random();
        let bob = Address::random();

        buy(&ledger, alice, (6, 1)).await?;
        let event = ledger.draw(&CallContext::without_value(alice)).await?;
        let LedgerEvent::DrawCompleted {
            random_first,
            random_second,
            reward,
            ..
        } = event
        else {
            panic!("expected a draw event");
        };
        let ticket = ledger.get_ticket(&alice).await?;
        let points = ledger.get_points(&alice).await?;

        let handles = [
            ticket.first.handle(),
            ticket.second.handle(),
            random_first.handle(),
            random_second.handle(),
            reward.handle(),
            points.handle(),
        ];
        for handle in handles {
            let readers = ledger.coprocessor().readers(&handle).await?;
            assert!(readers.contains(&alice), "{} not granted to player", handle);
            assert!(readers.contains(&contract), "{} not granted to ledger", handle);
            assert!(!readers.contains(&bob));
        }

        assert_eq!(ledger.user_decrypt(points, &alice).await?, SINGLE_MATCH_REWARD);
        assert!(ledger.user_decrypt(points, &bob).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_reads_are_idempotent() {
        let ledger = scripted([(3, 3)]).await;
        let alice = Address::random();

        buy(&ledger, alice, (3, 4)).await.unwrap();
        ledger.draw(&CallContext::without_value(alice)).await.unwrap();

        assert_eq!(
            ledger.get_ticket(&alice).await.unwrap(),
            ledger.get_ticket(&alice).await.unwrap()
        );
        assert_eq!(
            ledger.get_points(&alice).await.unwrap(),
            ledger.get_points(&alice).await.unwrap()
        );
        assert_eq!(
            ledger.get_last_draw(&alice).await.unwrap(),
            ledger.get_last_draw(&alice).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_players_are_independent() -> anyhow::Result<()> {
        let ledger = scripted([(8, 2)]).await;
        let alice = Address::random();
        let bob = Address::random();

        buy(&ledger, alice, (8, 2)).await?;
        buy(&ledger, bob, (8, 2)).await?;
        ledger.draw(&CallContext::without_value(alice)).await?;

        assert!(ledger.get_ticket(&bob).await?.active);
        assert!(!ledger.get_points(&bob).await?.is_initialized());
        assert_eq!(ledger.events(&bob).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_coprocessor_draws_fall_in_range() -> anyhow::Result<()> {
        init_tracing();
        let ledger = LotteryLedger::open(&test_config()).await?;
        let alice = Address::random();

        buy(&ledger, alice, (10, 11)).await?;
        let event = ledger.draw(&CallContext::without_value(alice)).await?;
        let LedgerEvent::DrawCompleted { reward, .. } = event else {
            panic!("expected a draw event");
        };

        let last = ledger.get_last_draw(&alice).await?.unwrap();
        for value in [last.first, last.second] {
            let drawn = ledger.user_decrypt(value, &alice).await?;
            assert!((1..=20).contains(&drawn));
        }
        let reward = ledger.user_decrypt(reward, &alice).await?;
        assert!([0, SINGLE_MATCH_REWARD, JACKPOT_REWARD].contains(&reward));
        Ok(())
    }

    #[tokio::test]
    async fn test_state_survives_reopen() -> anyhow::Result<()> {
        init_tracing();
        let temp_dir = tempdir()?;
        let config = test_config().with_db_path(temp_dir.path().join("ledger").join("veilpot.db"));
        let alice = Address::random();

        {
            let ledger = LotteryLedger::open(&config).await?;
            buy(&ledger, alice, (4, 12)).await?;
        }

        let ledger = LotteryLedger::open(&config).await?;
        let ticket = ledger.get_ticket(&alice).await?;
        assert!(ticket.active);
        assert_eq!(ledger.user_decrypt(ticket.first, &alice).await?, 4);
        assert_eq!(ledger.balance().await?, TICKET_PRICE);

        ledger.draw(&CallContext::without_value(alice)).await?;
        assert!(!ledger.get_ticket(&alice).await?.active);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let mut config = test_config();
        config.contract_address = Address::ZERO;

        let err = LotteryLedger::open(&config).await.unwrap_err();
        assert!(matches!(err, LotteryError::Config(_)));
    }
}
