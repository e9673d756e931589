use std::collections::HashMap;
use std::process;

use anyhow::{Result, anyhow, bail, ensure};
use fantasy_realm_core::{GameState, PeaceOutcome, describe_bundle};

use super::{
    parse_offer_id, parse_seconds, parse_speed, parse_terms, parse_worker, print_build_menu,
    print_country_details, print_events, print_help, print_log, print_map, print_offers,
    print_overview, print_research_menu, print_resources, print_status, print_workers,
    resolve_country,
};

const DEFAULT_LOG_LINES: usize = 10;

pub struct Context<'a> {
    game: &'a mut GameState,
}

impl<'a> Context<'a> {
    pub fn new(game: &'a mut GameState) -> Self {
        Self { game }
    }

    pub fn game(&self) -> &GameState {
        &*self.game
    }

    pub fn game_mut(&mut self) -> &mut GameState {
        &mut *self.game
    }
}

pub struct Args<'a> {
    tokens: Vec<&'a str>,
    index: usize,
}

impl<'a> Args<'a> {
    pub fn new(tokens: Vec<&'a str>) -> Self {
        Self { tokens, index: 0 }
    }

    pub fn next(&mut self) -> Option<&'a str> {
        let value = self.tokens.get(self.index).copied()?;
        self.index += 1;
        Some(value)
    }

    pub fn next_required(&mut self, message: &str) -> Result<&'a str> {
        self.next().ok_or_else(|| anyhow!(message.to_owned()))
    }
}

pub trait Command {
    fn name() -> &'static str;
    fn execute(ctx: &mut Context<'_>, args: Args<'_>) -> Result<()>;
}

type CommandFn = for<'a> fn(&mut Context<'a>, Args<'a>) -> Result<()>;

pub struct CommandRegistry {
    handlers: HashMap<&'static str, CommandFn>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register<C: Command>(&mut self) {
        self.register_as(C::name(), C::execute);
    }

    fn register_as(&mut self, name: &'static str, handler: CommandFn) {
        if self.handlers.insert(name, handler).is_some() {
            panic!("重複したコマンド登録です: {name}");
        }
    }

    pub fn dispatch<'a>(&self, command: &str, ctx: &mut Context<'a>, args: Args<'a>) -> Result<()> {
        match self.handlers.get(command) {
            Some(handler) => handler(ctx, args),
            None => bail!("未対応のコマンドです: {command}. help で一覧を確認してください。"),
        }
    }

    pub fn execute_input<'a>(&self, ctx: &mut Context<'a>, input: &'a str) -> Result<()> {
        let mut parts = input.split_whitespace();
        let Some(head) = parts.next() else {
            bail!("コマンドが指定されていません。");
        };
        let command_name = head.to_ascii_lowercase();
        let args = Args::new(parts.collect());
        self.dispatch(command_name.as_str(), ctx, args)
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register::<HelpCommand>();
        registry.register_as("?", HelpCommand::execute);
        registry.register::<OverviewCommand>();
        registry.register_as("ov", OverviewCommand::execute);
        registry.register::<InspectCommand>();
        registry.register_as("show", InspectCommand::execute);
        registry.register::<MapCommand>();
        registry.register::<LocateCommand>();
        registry.register::<ResourcesCommand>();
        registry.register::<WorkersCommand>();
        registry.register::<BuildCommand>();
        registry.register::<ResearchCommand>();
        registry.register::<TradeCommand>();
        registry.register::<AllyCommand>();
        registry.register::<WarCommand>();
        registry.register::<PeaceCommand>();
        registry.register::<OffersCommand>();
        registry.register::<AcceptCommand>();
        registry.register::<RejectCommand>();
        registry.register::<CounterCommand>();
        registry.register::<TickCommand>();
        registry.register::<SpeedCommand>();
        registry.register::<PauseCommand>();
        registry.register::<ResumeCommand>();
        registry.register::<LogCommand>();
        registry.register::<StatusCommand>();
        registry.register::<QuitCommand>();
        registry.register_as("exit", QuitCommand::execute);
        registry
    }
}

pub struct HelpCommand;

impl Command for HelpCommand {
    fn name() -> &'static str {
        "help"
    }

    fn execute(_ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        print_help();
        Ok(())
    }
}

pub struct OverviewCommand;

impl Command for OverviewCommand {
    fn name() -> &'static str {
        "overview"
    }

    fn execute(ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        print_overview(ctx.game());
        Ok(())
    }
}

pub struct InspectCommand;

impl Command for InspectCommand {
    fn name() -> &'static str {
        "inspect"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let token = args.next_required("対象を指定してください。")?;
        let id = resolve_country(ctx.game(), token)?;
        print_country_details(ctx.game(), id);
        Ok(())
    }
}

pub struct MapCommand;

impl Command for MapCommand {
    fn name() -> &'static str {
        "map"
    }

    fn execute(ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        print_map(ctx.game());
        Ok(())
    }
}

pub struct LocateCommand;

impl Command for LocateCommand {
    fn name() -> &'static str {
        "locate"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let mut coordinate = |label: &str| -> Result<f64> {
            let token = args.next_required(&format!("{label}座標を指定してください。"))?;
            token
                .parse()
                .map_err(|_| anyhow!("{label}座標は数値で指定してください: {token}"))
        };
        let x = coordinate("x")?;
        let y = coordinate("y")?;
        match ctx.game().country_at(x, y) {
            Some(id) => print_country_details(ctx.game(), id),
            None => println!("({x:.0}, {y:.0}) はどの国の領土でもありません。"),
        }
        Ok(())
    }
}

pub struct ResourcesCommand;

impl Command for ResourcesCommand {
    fn name() -> &'static str {
        "resources"
    }

    fn execute(ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        print_resources(ctx.game());
        Ok(())
    }
}

pub struct WorkersCommand;

impl Command for WorkersCommand {
    fn name() -> &'static str {
        "workers"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let Some(token) = args.next() else {
            print_workers(ctx.game());
            return Ok(());
        };
        let kind = parse_worker(token)?;
        let delta_text = args.next_required("増減する人数を指定してください (例: +2, -1)。")?;
        let delta: i32 = delta_text
            .trim_start_matches('+')
            .parse()
            .map_err(|_| anyhow!("人数は整数で指定してください: {delta_text}"))?;
        let count = ctx.game_mut().adjust_workers(kind, delta)?;
        println!("{} を {} 人にしました。", kind.label(), count);
        Ok(())
    }
}

pub struct BuildCommand;

impl Command for BuildCommand {
    fn name() -> &'static str {
        "build"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let Some(token) = args.next() else {
            print_build_menu(ctx.game());
            return Ok(());
        };
        let project = ctx.game_mut().start_construction(token)?;
        println!(
            "{} の建設を開始しました (完成まで {:.0} 秒)。",
            project.name,
            project.remaining_seconds(ctx.game().now_millis())
        );
        Ok(())
    }
}

pub struct ResearchCommand;

impl Command for ResearchCommand {
    fn name() -> &'static str {
        "research"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let Some(token) = args.next() else {
            print_research_menu(ctx.game());
            return Ok(());
        };
        let project = ctx.game_mut().start_research(token)?;
        let seconds =
            project.completes_at_millis.saturating_sub(project.started_at_millis) as f64 / 1000.0;
        println!(
            "{} の研究を開始しました (完了まで {:.0} 秒)。",
            project.name, seconds
        );
        Ok(())
    }
}

pub struct TradeCommand;

impl Command for TradeCommand {
    fn name() -> &'static str {
        "trade"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let token = args.next_required("交易相手を指定してください。")?;
        let partner = resolve_country(ctx.game(), token)?;
        let offered = args.next_required("提供する資源を指定してください (例: wood:20)。")?;
        let requested = args.next_required("要求する資源を指定してください (例: gold:10)。")?;
        let (offered, requested) = parse_terms(offered, requested)?;
        let outcome = ctx.game_mut().propose_trade(partner, &offered, &requested)?;
        let name = &ctx.game().countries()[partner].name;
        if outcome.accepted() {
            println!(
                "{} が交易に応じました。受領: {}",
                name,
                describe_bundle(&outcome.received)
            );
        } else {
            println!(
                "{} は交易を断りました (公正度 {:.0}% / 必要 {:.0}%)。",
                name, outcome.assessment.fairness, outcome.assessment.threshold
            );
        }
        Ok(())
    }
}

pub struct AllyCommand;

impl Command for AllyCommand {
    fn name() -> &'static str {
        "ally"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let token = args.next_required("同盟相手を指定してください。")?;
        let partner = resolve_country(ctx.game(), token)?;
        let accepted = ctx.game_mut().propose_alliance(partner)?;
        let name = &ctx.game().countries()[partner].name;
        if accepted {
            println!("{name} と同盟を結びました。");
        } else {
            println!("{name} は同盟の提案を断りました。");
        }
        Ok(())
    }
}

pub struct WarCommand;

impl Command for WarCommand {
    fn name() -> &'static str {
        "war"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let token = args.next_required("宣戦する相手を指定してください。")?;
        let partner = resolve_country(ctx.game(), token)?;
        let confirmed = args
            .next()
            .is_some_and(|flag| flag.eq_ignore_ascii_case("yes"));
        ensure!(
            confirmed,
            "宣戦布告には確認が必要です: war {} yes",
            token
        );
        ctx.game_mut().declare_war(partner)?;
        println!(
            "{} に宣戦布告しました。",
            ctx.game().countries()[partner].name
        );
        Ok(())
    }
}

pub struct PeaceCommand;

impl Command for PeaceCommand {
    fn name() -> &'static str {
        "peace"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let token = args.next_required("和平を結ぶ相手を指定してください。")?;
        let partner = resolve_country(ctx.game(), token)?;
        let outcome = ctx.game_mut().propose_peace(partner)?;
        let name = &ctx.game().countries()[partner].name;
        match outcome {
            PeaceOutcome::Accepted => println!("{name} との和平が成立しました。"),
            PeaceOutcome::Rejected => println!("{name} は和平を拒否しました。"),
        }
        Ok(())
    }
}

pub struct OffersCommand;

impl Command for OffersCommand {
    fn name() -> &'static str {
        "offers"
    }

    fn execute(ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        print_offers(ctx.game());
        Ok(())
    }
}

pub struct AcceptCommand;

impl Command for AcceptCommand {
    fn name() -> &'static str {
        "accept"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let id = parse_offer_id(args.next_required("提案番号を指定してください。")?)?;
        let received = ctx.game_mut().accept_offer(id)?;
        println!(
            "提案 #{id} を受け入れました。受領: {}",
            describe_bundle(&received)
        );
        Ok(())
    }
}

pub struct RejectCommand;

impl Command for RejectCommand {
    fn name() -> &'static str {
        "reject"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let id = parse_offer_id(args.next_required("提案番号を指定してください。")?)?;
        ctx.game_mut().reject_offer(id)?;
        println!("提案 #{id} を断りました。");
        Ok(())
    }
}

pub struct CounterCommand;

impl Command for CounterCommand {
    fn name() -> &'static str {
        "counter"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let id = parse_offer_id(args.next_required("提案番号を指定してください。")?)?;
        let offered = args.next_required("提供する資源を指定してください。")?;
        let requested = args.next_required("要求する資源を指定してください。")?;
        let (offered, requested) = parse_terms(offered, requested)?;
        let outcome = ctx.game_mut().counter_offer(id, &offered, &requested)?;
        if outcome.accepted() {
            println!(
                "逆提案が受け入れられました。受領: {}",
                describe_bundle(&outcome.received)
            );
        } else {
            println!(
                "逆提案は拒否されました (公正度 {:.0}%)。元の提案は取り下げられました。",
                outcome.assessment.fairness
            );
        }
        Ok(())
    }
}

pub struct TickCommand;

impl Command for TickCommand {
    fn name() -> &'static str {
        "tick"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let default = ctx.game().config().calendar.seconds_per_day as f64;
        let seconds = parse_seconds(args.next(), default)?;
        let events = ctx.game_mut().advance(seconds)?;
        let status = ctx.game().time_status();
        println!(
            "{:.1} 秒 (倍率 x{:.2}) 進めました。現在: {}",
            seconds, status.time_multiplier, status.date
        );
        print_events(&events);
        Ok(())
    }
}

pub struct SpeedCommand;

impl Command for SpeedCommand {
    fn name() -> &'static str {
        "speed"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let token = args.next_required("新しい時間倍率を指定してください。")?;
        let multiplier = ctx.game_mut().set_time_multiplier(parse_speed(token)?)?;
        println!("時間倍率 x{multiplier:.2} に設定しました。");
        Ok(())
    }
}

pub struct PauseCommand;

impl Command for PauseCommand {
    fn name() -> &'static str {
        "pause"
    }

    fn execute(ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        ctx.game_mut().pause();
        println!("時間を停止しました。resume で再開します。");
        Ok(())
    }
}

pub struct ResumeCommand;

impl Command for ResumeCommand {
    fn name() -> &'static str {
        "resume"
    }

    fn execute(ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        ctx.game_mut().resume();
        println!("時間を再開しました。");
        Ok(())
    }
}

pub struct LogCommand;

impl Command for LogCommand {
    fn name() -> &'static str {
        "log"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let limit = match args.next() {
            Some(token) => token
                .parse()
                .map_err(|_| anyhow!("件数は整数で指定してください: {token}"))?,
            None => DEFAULT_LOG_LINES,
        };
        print_log(ctx.game(), limit);
        Ok(())
    }
}

pub struct StatusCommand;

impl Command for StatusCommand {
    fn name() -> &'static str {
        "status"
    }

    fn execute(ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        print_status(ctx.game());
        Ok(())
    }
}

pub struct QuitCommand;

impl Command for QuitCommand {
    fn name() -> &'static str {
        "quit"
    }

    fn execute(_ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        println!("ゲームを終了します。");
        process::exit(0);
    }
}
