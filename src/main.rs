mod actions;
use actions::{
    action_create, action_delete, action_list, action_map, action_paths, action_preview,
    action_settings, action_settings_save, action_show, action_suggest, action_sync,
    action_values,
};
use anyhow::Result;
use seahorse::{App, Command, Flag, FlagType};
use std::env;

fn api_flag() -> Flag {
    Flag::new("api", FlagType::String).description("Backend base URL (overrides SDUI_API_URL)")
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Vec<String> = env::args().collect();
    let app = App::new("sdm")
        .description(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .usage("sdm [command] [args]")
        .command(
            Command::new("list")
                .description("List templates")
                .usage("sdm list")
                .flag(api_flag())
                .action(action_list),
        )
        .command(
            Command::new("show")
                .description("Show a template's variables and bindings")
                .usage("sdm show [template id]")
                .flag(api_flag())
                .action(action_show),
        )
        .command(
            Command::new("create")
                .description("Create a template from a JSON file")
                .usage("sdm create [name] [template json file]")
                .flag(api_flag())
                .action(action_create),
        )
        .command(
            Command::new("delete")
                .description("Delete a template")
                .usage("sdm delete [template id]")
                .flag(api_flag())
                .action(action_delete),
        )
        .command(
            Command::new("paths")
                .description("List the response paths of a sample response")
                .usage("sdm paths [response file]")
                .action(action_paths),
        )
        .command(
            Command::new("suggest")
                .description("Suggest response paths for a partially typed mapping")
                .usage("sdm suggest [text] --caret N --response [file] --pick N")
                .flag(Flag::new("caret", FlagType::Int).description("Caret position, defaults to end"))
                .flag(Flag::new("response", FlagType::String).description("Sample response file"))
                .flag(Flag::new("pick", FlagType::Int).description("Commit the n-th candidate"))
                .action(action_suggest),
        )
        .command(
            Command::new("map")
                .description("Bind response paths onto template variables and save")
                .usage("sdm map [template id] [mapping file] --response [file] --dry-run")
                .flag(api_flag())
                .flag(Flag::new("response", FlagType::String).description("Sample response file"))
                .flag(Flag::new("dry-run", FlagType::Bool).description("Print the document instead of saving"))
                .action(action_map),
        )
        .command(
            Command::new("values")
                .description("Set variable values and save")
                .usage("sdm values [template id] [values file] --mode static|dynamic")
                .flag(api_flag())
                .flag(Flag::new("mode", FlagType::String).description("Document to update"))
                .action(action_values),
        )
        .command(
            Command::new("settings")
                .description("Show a template's dynamic data source")
                .usage("sdm settings [template id]")
                .flag(api_flag())
                .action(action_settings),
        )
        .command(
            Command::new("settings-save")
                .description("Store a dynamic data source and switch to dynamic mode")
                .usage("sdm settings-save [template id] [settings file] --body [file]")
                .flag(api_flag())
                .flag(Flag::new("body", FlagType::String).description("Raw request body file"))
                .action(action_settings_save),
        )
        .command(
            Command::new("sync")
                .description("Fetch a live sample response from the data source")
                .usage("sdm sync [template id] --endpoint [url] --method [m] --body [file] --out [file]")
                .flag(api_flag())
                .flag(Flag::new("endpoint", FlagType::String).description("Endpoint URL"))
                .flag(Flag::new("method", FlagType::String).description("GET, POST, PUT, DELETE or PATCH"))
                .flag(Flag::new("body", FlagType::String).description("Request body file"))
                .flag(Flag::new("out", FlagType::String).description("Write the response here"))
                .action(action_sync),
        )
        .command(
            Command::new("preview")
                .description("Fetch the render-ready component")
                .usage("sdm preview [template id] --device mobile|tablet|web --out [dir]")
                .flag(api_flag())
                .flag(Flag::new("device", FlagType::String).description("Preview frame"))
                .flag(Flag::new("out", FlagType::String).description("Export directory"))
                .action(action_preview),
        );
    app.run(args);
    Ok(())
}
