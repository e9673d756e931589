mod commands;

use std::io::{self, BufRead, Write};

use anyhow::{Context as _, Result, anyhow, ensure};
use fantasy_realm_core::{
    CountryId, GameEvent, GameState, PLAYER_ID, ResourceBundle, ResourceKind, WorkerKind,
    describe_bundle, parse_bundle,
};

use commands::{CommandRegistry, Context};

pub fn run(game: &mut GameState) -> Result<()> {
    print_intro(game);
    let registry = CommandRegistry::default();
    let stdin = io::stdin();

    loop {
        print!("[{}]> ", game.calendar_date());
        io::stdout()
            .flush()
            .context("プロンプトのフラッシュに失敗しました")?;

        let mut line = String::new();
        let bytes = stdin
            .lock()
            .read_line(&mut line)
            .context("入力の読み込みに失敗しました")?;

        if bytes == 0 {
            println!("入力が終了したためゲームを終了します。");
            return Ok(());
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut ctx = Context::new(game);
        if let Err(error) = registry.execute_input(&mut ctx, trimmed) {
            println!("エラー: {error}");
        }
    }
}

fn print_intro(game: &GameState) {
    println!("{}へようこそ。", game.config().game_name);
    println!(
        "あなたは {} の統治者です。世界には {} の国があります。",
        game.player().name,
        game.countries().len()
    );
    println!("コマンド例: overview / resources / build farm / trade 3 wood:20 gold:10 / tick 10");
    println!("help で利用可能なコマンド一覧を表示します。");
}

pub(crate) fn print_help() {
    println!("利用可能なコマンド:");
    println!("  overview                    全ての国の一覧を表示");
    println!("  inspect <国>                国の詳細と関係を表示");
    println!("  map                         大陸と国の配置を表示");
    println!("  locate <x> <y>              座標にある国を表示");
    println!("  resources                   自国の資源・生産量・貯蔵上限を表示");
    println!("  workers [<種類> <増減>]     労働者の一覧表示または配置変更");
    println!("  build [<建物>]              建築メニュー表示または建設開始");
    println!("  research [<研究>]           研究メニュー表示または研究開始");
    println!("  trade <国> <提供> <要求>    交易を提案 (例: trade 2 wood:20 gold:10)");
    println!("  ally <国>                   同盟を提案");
    println!("  war <国> yes                宣戦布告 (確認のため yes が必要)");
    println!("  peace <国>                  和平を提案");
    println!("  offers                      届いている交易提案を表示");
    println!("  accept <番号>               交易提案を受け入れる");
    println!("  reject <番号>               交易提案を断る");
    println!("  counter <番号> <提供> <要求> 条件を変えて逆提案");
    println!("  tick [<秒>]                 時間を進める (省略時は1日分)");
    println!("  speed <倍率>                時間倍率を設定 (0.1〜5.0)");
    println!("  pause / resume              時間の停止と再開");
    println!("  log [<件数>]                出来事の記録を表示");
    println!("  status                      王国と時間の状況を表示");
    println!("  quit                        ゲームを終了");
}

pub(crate) fn print_overview(game: &GameState) {
    println!(
        "ID | {:<20} | {:<6} | {:>5} | {:<10} | {:<8} | {:>4}",
        "国名", "規模", "兵力", "軍事力", "関係", "友好"
    );
    let diplomacy = game.diplomacy();
    for country in game.countries() {
        let (status, friendship) = if country.id == PLAYER_ID {
            ("自国".to_string(), "-".to_string())
        } else {
            (
                diplomacy.relationship_status(PLAYER_ID, country.id).label().to_string(),
                diplomacy.relationship(PLAYER_ID, country.id).to_string(),
            )
        };
        println!(
            "{:>2} | {:<20} | {:<6} | {:>5} | {:<10} | {:<8} | {:>4}",
            country.id,
            country.name,
            country.size_class().label(),
            country.army.size,
            country.power_level().label(),
            status,
            friendship
        );
    }
}

pub(crate) fn print_country_details(game: &GameState, id: CountryId) {
    let country = &game.countries()[id];
    let summary = country.summary();
    println!("-- {} の状況 --", summary.name);
    println!("国色: {}", summary.color);
    println!("首都: ({:.0}, {:.0}) / 大陸 {}", country.x, country.y, country.continent);
    println!("規模: {} ({})", country.size, country.size_class().label());
    println!(
        "軍事: {} (兵力 {}, 戦力 {:.0})",
        summary.power.label(),
        summary.army_size,
        country.military_power()
    );
    println!("領土: {} 区画", country.territory_cells);
    if summary.traits.is_empty() {
        println!("特性: なし");
    } else {
        println!("特性: {}", summary.traits.join(", "));
    }

    println!("資源:");
    for (kind, resource) in &country.resources {
        let mark = if resource.abundant { " (豊富)" } else { "" };
        println!(
            "  - {:<6}: 保有 {:>6.0} / 生産 {:.2}{}",
            kind.label(),
            resource.amount,
            resource.production,
            mark
        );
    }

    let names = |ids: &[CountryId]| {
        ids.iter()
            .map(|&other| game.countries()[other].name.clone())
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!("隣国: {}", names(&country.neighbours));
    let diplomacy = game.diplomacy();
    println!("同盟国: {}", names(&diplomacy.allies_of(id)));
    println!("交戦国: {}", names(&diplomacy.enemies_of(id)));
    if id != PLAYER_ID {
        println!(
            "自国への態度: {} ({})",
            diplomacy.stance(id, PLAYER_ID).label(),
            diplomacy.relationship(id, PLAYER_ID)
        );
        println!(
            "自国からの関係: {} ({})",
            diplomacy.relationship_status(PLAYER_ID, id).label(),
            diplomacy.relationship(PLAYER_ID, id)
        );
    }
}

pub(crate) fn print_map(game: &GameState) {
    let map = game.map();
    println!("世界地図 {:.0} x {:.0}", map.width, map.height);
    for continent in &map.continents {
        let features = map
            .features
            .iter()
            .filter(|feature| feature.continent == continent.id)
            .count();
        println!(
            "大陸 {}: 中心 ({:.0}, {:.0}) / 面積 {:.0} / 地形 {} / 国 {}/{}",
            continent.id,
            continent.bounding_box.center_x,
            continent.bounding_box.center_y,
            continent.area(),
            features,
            continent.countries.len(),
            continent.max_countries
        );
        for &id in &continent.countries {
            let country = &game.countries()[id];
            println!(
                "  {:>2} {:<20} ({:.0}, {:.0})",
                id, country.name, country.x, country.y
            );
        }
    }
}

pub(crate) fn print_resources(game: &GameState) {
    let resources = game.resources();
    println!(
        "{:<6} | {:>8} | {:>8} | {:>8}",
        "資源", "保有", "毎秒", "上限"
    );
    for kind in ResourceKind::ALL {
        let capacity = resources
            .storage_capacity(kind)
            .map(|cap| format!("{cap:.0}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<6} | {:>8.1} | {:>8.2} | {:>8}",
            kind.label(),
            resources.amount(kind),
            resources.rate(kind),
            capacity
        );
    }
    println!(
        "1日の食料消費: {:.1}",
        resources.daily_food_consumption()
    );
}

pub(crate) fn print_workers(game: &GameState) {
    let workforce = game.resources().workforce();
    for (kind, group) in workforce.iter() {
        println!(
            "{:<6}: {:>2}/{:>2} 人 効率 {:>3.0}% ({}を生産)",
            kind.label(),
            group.count,
            group.max,
            group.efficiency * 100.0,
            kind.produces().label()
        );
    }
    println!("合計 {} 人", workforce.total());
}

pub(crate) fn print_build_menu(game: &GameState) {
    println!("建築メニュー:");
    for (idx, building) in game.building_catalog().buildings().iter().enumerate() {
        println!(
            "{:>2}. {:<10} ({}) {:.0} 秒 / {} / 保有 {}",
            idx + 1,
            building.name,
            building.key,
            building.build_seconds,
            building.cost_summary(),
            game.resources().building_count(building.kind)
        );
    }
    print_projects(game);
}

pub(crate) fn print_research_menu(game: &GameState) {
    println!("研究メニュー:");
    for (idx, topic) in game.research_catalog().topics().iter().enumerate() {
        let state = if game.resources().has_research(&topic.key) {
            "研究済み"
        } else {
            "未研究"
        };
        println!(
            "{:>2}. {} ({}) {:.0} 秒 / {} / {}",
            idx + 1,
            topic.name,
            topic.key,
            topic.research_seconds,
            describe_bundle(&topic.cost),
            state
        );
        if !topic.description.is_empty() {
            println!("      {}", topic.description);
        }
    }
    print_projects(game);
}

fn print_projects(game: &GameState) {
    let now = game.now_millis();
    for project in game.constructions() {
        println!(
            "建設中: {} {:.0}% (残り {:.0} 秒)",
            project.name,
            project.progress(now) * 100.0,
            project.remaining_seconds(now)
        );
    }
    for project in game.research_projects() {
        println!(
            "研究中: {} (残り {:.0} 秒)",
            project.name,
            project.completes_at_millis.saturating_sub(now) as f64 / 1000.0
        );
    }
}

pub(crate) fn print_offers(game: &GameState) {
    if game.offers().is_empty() {
        println!("届いている交易提案はありません。");
        return;
    }
    let now = game.now_millis();
    for offer in game.offers() {
        println!(
            "#{} {}: {} を提供 / {} を要求 (残り {:.0} 秒)",
            offer.id,
            game.countries()[offer.from].name,
            describe_bundle(&offer.offered),
            describe_bundle(&offer.requested),
            offer.remaining_seconds(now)
        );
    }
}

pub(crate) fn print_events(events: &[GameEvent]) {
    for event in events {
        println!("- {event}");
    }
}

pub(crate) fn print_log(game: &GameState, limit: usize) {
    if game.event_log().is_empty() {
        println!("記録はまだありません。");
        return;
    }
    for entry in game.event_log().entries().take(limit) {
        println!("{} [{}] {}", entry.date, entry.kind.label(), entry.message);
    }
}

pub(crate) fn print_status(game: &GameState) {
    let status = game.time_status();
    println!("{} の状況: {}", game.player().name, game.kingdom_status().label());
    println!(
        "日付: {} (本日 {:.0}% 経過) / 経過 {:.1} 秒",
        status.date,
        status.day_progress * 100.0,
        status.elapsed_seconds
    );
    println!(
        "時間倍率: x{:.2} / {}",
        status.time_multiplier,
        if status.running { "進行中" } else { "一時停止中" }
    );
    if let Some(next) = status.next_task_in_seconds {
        println!("次の予定処理まで {:.1} 秒", next);
    }
    print_projects(game);
}

pub(crate) fn resolve_country(game: &GameState, token: &str) -> Result<CountryId> {
    game.find_country(token).ok_or_else(|| {
        anyhow!(
            "国を特定できませんでした: {} (ID か完全な国名を入力してください)",
            token
        )
    })
}

pub(crate) fn parse_worker(token: &str) -> Result<WorkerKind> {
    WorkerKind::parse(token)
}

pub(crate) fn parse_terms(offered: &str, requested: &str) -> Result<(ResourceBundle, ResourceBundle)> {
    Ok((parse_bundle(offered)?, parse_bundle(requested)?))
}

pub(crate) fn parse_speed(token: &str) -> Result<f64> {
    let value: f64 = token
        .trim_start_matches('x')
        .parse()
        .map_err(|_| anyhow!("時間倍率は数値で指定してください。"))?;
    ensure!(
        value.is_finite() && value > 0.0,
        "時間倍率は正の値で指定してください。"
    );
    Ok(value)
}

pub(crate) fn parse_seconds(token: Option<&str>, default: f64) -> Result<f64> {
    let Some(token) = token else {
        return Ok(default);
    };
    let value: f64 = token
        .parse()
        .map_err(|_| anyhow!("秒数は数値で指定してください。"))?;
    ensure!(
        value.is_finite() && value > 0.0,
        "秒数は正の値で指定してください。"
    );
    Ok(value)
}

pub(crate) fn parse_offer_id(token: &str) -> Result<u64> {
    token
        .trim_start_matches('#')
        .parse()
        .map_err(|_| anyhow!("提案番号は数値で指定してください: {}", token))
}
