//! Economy commands - `credits`, `daily` and `give`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{Context, format_remaining},
        core::economy::{self, DailyClaim, Participant},
        errors::Result,
    };
    use chrono::Utc;
    use poise::serenity_prelude::{self as serenity, Mentionable};

    const BALANCE_COLOUR: u32 = 0x2e_cc71;

    /// Shows your balance or another member's.
    #[poise::command(slash_command, prefix_command, aliases("credit", "bal", "balance"))]
    pub async fn credits(
        ctx: Context<'_>,
        #[description = "Member to check (defaults to you)"] member: Option<serenity::User>,
    ) -> Result<()> {
        let user = member.as_ref().unwrap_or_else(|| ctx.author());
        if user.bot {
            ctx.say("❌ Bots don't have a balance.").await?;
            return Ok(());
        }

        let balance = economy::balance(&ctx.data().database, user.id.get()).await?;
        let embed = serenity::CreateEmbed::new()
            .description(format!(
                "💰 **{}**, your balance is `${balance}`",
                user.display_name()
            ))
            .colour(BALANCE_COLOUR);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Claims the daily reward.
    #[poise::command(slash_command, prefix_command)]
    pub async fn daily(ctx: Context<'_>) -> Result<()> {
        let data = ctx.data();
        let economy_config = &data.config.tunables.economy;
        let user_id = ctx.author().id.get();
        let now = Utc::now();

        let amount = economy::roll_daily_amount(&mut rand::rng(), economy_config.daily_range());
        let claim = economy::claim_daily(
            &data.database,
            user_id,
            amount,
            now,
            economy_config.daily_cooldown(),
        )
        .await?;
        let account = match claim {
            DailyClaim::Granted(account) => account,
            DailyClaim::Cooldown(remaining) => {
                ctx.send(
                    poise::CreateReply::default()
                        .content(format!(
                            "⏳ You can claim your daily reward again in `{}`",
                            format_remaining(remaining)
                        ))
                        .ephemeral(true),
                )
                .await?;
                return Ok(());
            }
        };
        tracing::info!(
            "User {user_id} claimed daily reward of {amount}, balance now {}",
            account.credits
        );

        let embed = serenity::CreateEmbed::new()
            .description(format!(
                "✅ **{}**, you received `${amount}` as your daily reward!",
                ctx.author().display_name()
            ))
            .colour(BALANCE_COLOUR);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Sends credits to another member.
    #[poise::command(slash_command, prefix_command, aliases("transfer", "pay"))]
    pub async fn give(
        ctx: Context<'_>,
        #[description = "Who receives the credits"] member: serenity::User,
        #[description = "Amount to send"] amount: i64,
    ) -> Result<()> {
        let from = Participant {
            user_id: ctx.author().id.get(),
            is_bot: ctx.author().bot,
        };
        let to = Participant {
            user_id: member.id.get(),
            is_bot: member.bot,
        };

        // Validation and balance failures surface through on_error as rejections
        let receipt = economy::transfer(&ctx.data().database, from, to, amount).await?;

        ctx.say(format!(
            "✅ **{}**, sent `${}` to {}. Your balance is now `${}`.",
            ctx.author().display_name(),
            receipt.amount,
            member.mention(),
            receipt.sender_balance
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
