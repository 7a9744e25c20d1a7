//! Game commands.
//!
//! The one-shot games answer immediately. `math`, `fast` and `guess` wait for chat messages with
//! a message collector; `xo` and `roulette` drive the state objects in
//! [`crate::core::games`] from button and select presses collected on the game message. Every
//! wait is bounded, and a timeout ends the game (or, in roulette, eliminates a random player).

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{Context, handlers::interactions::respond_ephemeral},
        core::games::{
            self, GuessGame, Hand, Hint, MathProblem, RoundResult,
            roulette::{LOBBY_DURATION, Player, RouletteGame, RouletteLobby, SEATS},
            tictactoe::{Mark, Outcome, TicTacToe},
        },
        errors::Result,
    };
    use poise::serenity_prelude::{self as serenity, Mentionable};
    use std::time::{Duration, Instant};

    const MATH_TIME: Duration = Duration::from_secs(10);
    const FAST_TIME: Duration = Duration::from_secs(15);
    const GUESS_TIME: Duration = Duration::from_secs(30);
    const XO_IDLE_TIME: Duration = Duration::from_secs(60);
    const PICK_TIME: Duration = Duration::from_secs(30);
    const ROUND_PAUSE: Duration = Duration::from_secs(2);
    /// Seat buttons per row
    const SEATS_PER_ROW: u8 = 5;
    /// Options Discord allows in a select menu
    const MAX_SELECT_OPTIONS: usize = 25;

    /// Rock, paper, scissors against the bot.
    #[poise::command(slash_command, prefix_command)]
    pub async fn rps(
        ctx: Context<'_>,
        #[description = "حجرة, ورقة or مقص"] choice: String,
    ) -> Result<()> {
        let Some(hand) = Hand::parse(&choice) else {
            let names: Vec<&str> = Hand::ALL.iter().map(|h| h.name()).collect();
            ctx.say(format!("❌ Invalid choice! Pick one of: {}", names.join(", ")))
                .await?;
            return Ok(());
        };

        let bot_hand = games::random_hand(&mut rand::rng());
        let result = match games::play_rps(hand, bot_hand) {
            RoundResult::Win => "You win! 🎉",
            RoundResult::Lose => "I win! 🤖",
            RoundResult::Draw => "Draw! 🤝",
        };

        let embed = serenity::CreateEmbed::new()
            .title("Rock Paper Scissors")
            .colour(0xf1_c40f)
            .field("Your choice", hand.name(), true)
            .field("My choice", bot_hand.name(), true)
            .field("Result", result, false);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Flips a coin.
    #[poise::command(slash_command, prefix_command, aliases("flip"))]
    pub async fn coin(ctx: Context<'_>) -> Result<()> {
        let side = games::flip_coin(&mut rand::rng());
        ctx.say(format!("🪙 It landed on: **{side}**")).await?;
        Ok(())
    }

    /// Rolls a number from 1 to 100.
    #[poise::command(slash_command, prefix_command)]
    pub async fn roll(ctx: Context<'_>) -> Result<()> {
        let value = games::roll(&mut rand::rng());
        ctx.say(format!("🎲 You rolled: **{value}**")).await?;
        Ok(())
    }

    /// Spins the slot machine.
    #[poise::command(slash_command, prefix_command)]
    pub async fn slots(ctx: Context<'_>) -> Result<()> {
        let reels = games::spin_slots(&mut rand::rng());
        let machine = format!("**[ {} {} {} ]**", reels[0], reels[1], reels[2]);
        let verdict = if games::slots_win(&reels) {
            "🎉 Jackpot! You win!"
        } else {
            "❌ Better luck next time."
        };
        ctx.say(format!("{machine}\n{verdict}")).await?;
        Ok(())
    }

    /// Solve a quick arithmetic problem.
    #[poise::command(slash_command, prefix_command)]
    pub async fn math(ctx: Context<'_>) -> Result<()> {
        let problem = MathProblem::random(&mut rand::rng());
        let answer = problem.answer();
        ctx.say(format!(
            "🔢 Solve: **{problem}** (you have {} seconds)",
            MATH_TIME.as_secs()
        ))
        .await?;

        let reply = serenity::MessageCollector::new(ctx)
            .author_id(ctx.author().id)
            .channel_id(ctx.channel_id())
            .filter(|m| MathProblem::parse_answer(&m.content).is_some())
            .timeout(MATH_TIME)
            .await;

        let text = match reply.and_then(|m| MathProblem::parse_answer(&m.content)) {
            Some(given) if given == answer => "✅ Correct! Well done!".to_string(),
            Some(_) => format!("❌ Wrong. The answer was {answer}"),
            None => format!("⏰ Time's up! The answer was {answer}"),
        };
        ctx.say(text).await?;
        Ok(())
    }

    /// First to type the shown word wins.
    #[poise::command(slash_command, prefix_command)]
    pub async fn fast(ctx: Context<'_>) -> Result<()> {
        let word = games::fast_word(&mut rand::rng());
        let embed = serenity::CreateEmbed::new()
            .title("Fastest typer")
            .description(format!("Type this word as fast as you can:\n\n**{word}**"))
            .colour(serenity::Colour::GOLD);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;

        let started = Instant::now();
        let winner = serenity::MessageCollector::new(ctx)
            .channel_id(ctx.channel_id())
            .filter(move |m| !m.author.bot && m.content.trim() == word)
            .timeout(FAST_TIME)
            .await;

        let text = match winner {
            Some(message) => format!(
                "🎉 Nice one {}! You typed it in {:.2} seconds.",
                message.author.mention(),
                started.elapsed().as_secs_f64()
            ),
            None => format!("⏰ Time's up! Nobody typed `{word}`."),
        };
        ctx.say(text).await?;
        Ok(())
    }

    /// Guess the number between 1 and 50.
    #[poise::command(slash_command, prefix_command)]
    pub async fn guess(ctx: Context<'_>) -> Result<()> {
        let game = GuessGame::random(&mut rand::rng());
        ctx.say(format!(
            "🕵️ I picked a number between 1 and {}. You have {} seconds per guess!",
            GuessGame::MAX,
            GUESS_TIME.as_secs()
        ))
        .await?;

        loop {
            let attempt = serenity::MessageCollector::new(ctx)
                .channel_id(ctx.channel_id())
                .filter(|m| !m.author.bot && m.content.trim().parse::<u32>().is_ok())
                .timeout(GUESS_TIME)
                .await;

            let Some(message) = attempt else {
                ctx.say(format!(
                    "⏰ Time's up! Nobody got it. The number was {}.",
                    game.secret()
                ))
                .await?;
                return Ok(());
            };
            let Ok(value) = message.content.trim().parse::<u32>() else {
                continue;
            };

            match game.check(value) {
                Hint::Correct => {
                    ctx.say(format!(
                        "🎯 Congratulations {}! The number was {}.",
                        message.author.mention(),
                        game.secret()
                    ))
                    .await?;
                    return Ok(());
                }
                Hint::Higher => {
                    ctx.say(format!("⬆️ Higher than {value}!")).await?;
                }
                Hint::Lower => {
                    ctx.say(format!("⬇️ Lower than {value}!")).await?;
                }
            }
        }
    }

    fn xo_rows(game: &TicTacToe, prefix: &str, finished: bool) -> Vec<serenity::CreateActionRow> {
        (0..3)
            .map(|row| {
                let buttons = (0..3)
                    .map(|col| {
                        let index = row * 3 + col;
                        let button = serenity::CreateButton::new(format!("{prefix}{index}"));
                        match game.cell(index) {
                            Some(mark) => button
                                .label(mark.symbol())
                                .style(match mark {
                                    Mark::X => serenity::ButtonStyle::Danger,
                                    Mark::O => serenity::ButtonStyle::Success,
                                })
                                .disabled(true),
                            None => button
                                .label("\u{200b}")
                                .style(serenity::ButtonStyle::Secondary)
                                .disabled(finished),
                        }
                    })
                    .collect();
                serenity::CreateActionRow::Buttons(buttons)
            })
            .collect()
    }

    fn turn_text(game: &TicTacToe) -> String {
        format!(
            "Turn: <@{}> ({})",
            game.current_player(),
            game.turn().symbol()
        )
    }

    /// Tic-tac-toe against another member.
    #[poise::command(slash_command, prefix_command, guild_only)]
    pub async fn xo(
        ctx: Context<'_>,
        #[description = "Who to play against"] opponent: serenity::User,
    ) -> Result<()> {
        if opponent.id == ctx.author().id {
            ctx.say("❌ You can't play against yourself.").await?;
            return Ok(());
        }
        if opponent.bot {
            ctx.say("❌ You can't play against a bot.").await?;
            return Ok(());
        }

        let mut game = TicTacToe::new(ctx.author().id.get(), opponent.id.get());
        let prefix = format!("xo:{}:", ctx.id());

        let reply = ctx
            .send(
                poise::CreateReply::default()
                    .content(format!(
                        "🎮 {} vs {}! {} starts ({})",
                        ctx.author().mention(),
                        opponent.mention(),
                        ctx.author().mention(),
                        Mark::X.symbol()
                    ))
                    .components(xo_rows(&game, &prefix, false)),
            )
            .await?;

        loop {
            let filter_prefix = prefix.clone();
            let Some(press) = serenity::ComponentInteractionCollector::new(ctx)
                .channel_id(ctx.channel_id())
                .filter(move |i| i.data.custom_id.starts_with(&filter_prefix))
                .timeout(XO_IDLE_TIME)
                .await
            else {
                reply
                    .edit(
                        ctx,
                        poise::CreateReply::default()
                            .content("⏰ Game abandoned.")
                            .components(xo_rows(&game, &prefix, true)),
                    )
                    .await?;
                return Ok(());
            };

            let Some(index) = press
                .data
                .custom_id
                .strip_prefix(&prefix)
                .and_then(|i| i.parse::<usize>().ok())
            else {
                continue;
            };

            match game.play(press.user.id.get(), index) {
                Err(e) => respond_ephemeral(ctx, &press, &format!("❌ {e}")).await?,
                Ok(outcome) => {
                    let content = match outcome {
                        Some(Outcome::Winner(mark)) => {
                            format!("🎉 The winner is <@{}>!", game.player(mark))
                        }
                        Some(Outcome::Draw) => "🤝 Draw!".to_string(),
                        None => turn_text(&game),
                    };
                    let update = serenity::CreateInteractionResponseMessage::new()
                        .content(content)
                        .components(xo_rows(&game, &prefix, outcome.is_some()));
                    press
                        .create_response(ctx, serenity::CreateInteractionResponse::UpdateMessage(update))
                        .await?;
                    if outcome.is_some() {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn lobby_embed() -> serenity::CreateEmbed {
        serenity::CreateEmbed::new()
            .title("🎮 Group roulette")
            .description(format!(
                "Press a button to take a seat!\nThe game needs at least {} players.\nRegistration closes in {} seconds.",
                crate::core::games::roulette::MIN_PLAYERS,
                LOBBY_DURATION.as_secs()
            ))
            .colour(serenity::Colour::PURPLE)
    }

    fn seat_rows(lobby: &RouletteLobby, prefix: &str, closed: bool) -> Vec<serenity::CreateActionRow> {
        (0..SEATS / SEATS_PER_ROW)
            .map(|row| {
                let buttons = (1..=SEATS_PER_ROW)
                    .map(|offset| {
                        let seat = row * SEATS_PER_ROW + offset;
                        let button = serenity::CreateButton::new(format!("{prefix}{seat}"));
                        match lobby.holder(seat) {
                            Some(player) => button
                                .label(player.name.chars().take(10).collect::<String>())
                                .style(serenity::ButtonStyle::Success)
                                .disabled(true),
                            None => button
                                .label(seat.to_string())
                                .style(serenity::ButtonStyle::Secondary)
                                .disabled(closed),
                        }
                    })
                    .collect();
                serenity::CreateActionRow::Buttons(buttons)
            })
            .collect()
    }

    fn pick_menu(game: &RouletteGame, spinner: u64, custom_id: &str) -> serenity::CreateActionRow {
        let options = game
            .targets(spinner)
            .into_iter()
            .take(MAX_SELECT_OPTIONS)
            .map(|p| serenity::CreateSelectMenuOption::new(p.name.clone(), p.id.to_string()))
            .collect();
        serenity::CreateActionRow::SelectMenu(
            serenity::CreateSelectMenu::new(
                custom_id,
                serenity::CreateSelectMenuKind::String { options },
            )
            .placeholder("Pick who leaves the game..."),
        )
    }

    /// Runs the registration phase until the lobby timer runs out.
    async fn run_lobby(ctx: Context<'_>, prefix: &str) -> Result<RouletteLobby> {
        let mut lobby = RouletteLobby::new();
        let reply = ctx
            .send(
                poise::CreateReply::default()
                    .embed(lobby_embed())
                    .components(seat_rows(&lobby, prefix, false)),
            )
            .await?;

        let deadline = Instant::now() + LOBBY_DURATION;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }

            let filter_prefix = prefix.to_string();
            let Some(press) = serenity::ComponentInteractionCollector::new(ctx)
                .channel_id(ctx.channel_id())
                .filter(move |i| i.data.custom_id.starts_with(&filter_prefix))
                .timeout(remaining)
                .await
            else {
                break;
            };

            let Some(seat) = press
                .data
                .custom_id
                .strip_prefix(prefix)
                .and_then(|s| s.parse::<u8>().ok())
            else {
                continue;
            };

            let player = Player {
                id: press.user.id.get(),
                name: press.user.display_name().to_string(),
            };
            match lobby.take_seat(seat, player) {
                Ok(()) => {
                    let update = serenity::CreateInteractionResponseMessage::new()
                        .components(seat_rows(&lobby, prefix, false));
                    press
                        .create_response(ctx, serenity::CreateInteractionResponse::UpdateMessage(update))
                        .await?;
                }
                Err(e) => respond_ephemeral(ctx, &press, &format!("❌ {e}")).await?,
            }
        }

        reply
            .edit(
                ctx,
                poise::CreateReply::default()
                    .embed(lobby_embed())
                    .components(seat_rows(&lobby, prefix, true)),
            )
            .await?;
        Ok(lobby)
    }

    /// Waits for the spinner's choice. `None` when they run out of time.
    async fn await_pick(ctx: Context<'_>, spinner: u64, custom_id: &str) -> Result<Option<u64>> {
        let deadline = Instant::now() + PICK_TIME;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }

            let wanted = custom_id.to_string();
            let Some(press) = serenity::ComponentInteractionCollector::new(ctx)
                .channel_id(ctx.channel_id())
                .filter(move |i| i.data.custom_id == wanted)
                .timeout(remaining)
                .await
            else {
                return Ok(None);
            };

            if press.user.id.get() != spinner {
                respond_ephemeral(ctx, &press, "❌ This menu isn't for you!").await?;
                continue;
            }

            let target = match &press.data.kind {
                serenity::ComponentInteractionDataKind::StringSelect { values } => {
                    values.first().and_then(|v| v.parse::<u64>().ok())
                }
                _ => None,
            };
            let update = serenity::CreateInteractionResponseMessage::new().components(Vec::new());
            press
                .create_response(ctx, serenity::CreateInteractionResponse::UpdateMessage(update))
                .await?;
            return Ok(target);
        }
    }

    /// Group elimination roulette (20 seats).
    #[poise::command(slash_command, prefix_command, guild_only)]
    pub async fn roulette(ctx: Context<'_>) -> Result<()> {
        let seat_prefix = format!("roulette:{}:seat:", ctx.id());
        let lobby = run_lobby(ctx, &seat_prefix).await?;

        let Some(mut game) = lobby.close() else {
            ctx.say(format!(
                "❌ Game cancelled: fewer than {} players joined.",
                crate::core::games::roulette::MIN_PLAYERS
            ))
            .await?;
            return Ok(());
        };
        ctx.say("🏁 Registration closed! The game begins...").await?;

        let mut round = 0_u32;
        while game.winner().is_none() {
            let Some(spinner) = game.spin(&mut rand::rng()) else {
                break;
            };
            round += 1;
            let pick_id = format!("roulette:{}:pick:{round}", ctx.id());

            let embed = serenity::CreateEmbed::new()
                .title("🔄 The roulette is spinning...")
                .description(format!(
                    "The roulette stopped at <@{}>!\n\nThey must now pick someone to eliminate.",
                    spinner.id
                ))
                .colour(serenity::Colour::ORANGE);
            ctx.send(
                poise::CreateReply::default()
                    .content(format!("<@{}>", spinner.id))
                    .embed(embed)
                    .components(vec![pick_menu(&game, spinner.id, &pick_id)]),
            )
            .await?;

            let chosen = match await_pick(ctx, spinner.id, &pick_id).await? {
                Some(target) => game.eliminate(spinner.id, target).ok(),
                None => None,
            };
            let text = match chosen {
                Some(out) => format!("🔥 <@{}> eliminated <@{}>!", spinner.id, out.id),
                None => match game.eliminate_random(spinner.id, &mut rand::rng()) {
                    Some(out) => format!(
                        "⏰ <@{}> took too long, <@{}> was eliminated at random!",
                        spinner.id, out.id
                    ),
                    None => break,
                },
            };
            ctx.say(text).await?;
            tokio::time::sleep(ROUND_PAUSE).await;
        }

        if let Some(winner) = game.winner() {
            let embed = serenity::CreateEmbed::new()
                .title("🏆 Game over")
                .description(format!(
                    "Congratulations to the last one standing: <@{}>! 🎉",
                    winner.id
                ))
                .colour(serenity::Colour::GOLD);
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
