use gtk::prelude::*;
use relm4::prelude::*;

pub struct InputArea {
    buffer: gtk::TextBuffer,
    sending: bool,
    has_text: bool,
}

#[derive(Debug)]
pub enum InputAreaMsg {
    SendClicked,
    SetSending(bool),
    Clear,
    // Internal
    TextChanged,
}

#[derive(Debug)]
pub enum InputAreaOutput {
    SendMessage(String),
}

#[relm4::component(pub)]
impl Component for InputArea {
    type Init = ();
    type Input = InputAreaMsg;
    type Output = InputAreaOutput;
    type CommandOutput = ();

    view! {
        gtk::Box {
            set_orientation: gtk::Orientation::Vertical,
            set_spacing: 0,

            gtk::Box {
                set_orientation: gtk::Orientation::Horizontal,
                set_spacing: 8,
                set_margin_top: 8,
                set_margin_bottom: 4,
                set_margin_start: 12,
                set_margin_end: 12,
                add_css_class: "input-card",

                gtk::Overlay {
                    set_hexpand: true,

                    gtk::ScrolledWindow {
                        set_hexpand: true,
                        set_max_content_height: 150,
                        set_propagate_natural_height: true,
                        set_min_content_height: 40,

                        #[name = "text_view"]
                        gtk::TextView {
                            set_wrap_mode: gtk::WrapMode::WordChar,
                            set_accepts_tab: false,
                            set_top_margin: 8,
                            set_bottom_margin: 8,
                            set_left_margin: 8,
                            set_right_margin: 8,
                            add_css_class: "input-text-view",
                            #[watch]
                            set_editable: !model.sending,

                            set_buffer: Some(&model.buffer),
                        },
                    },

                    add_overlay = &gtk::Label {
                        set_label: "Tanyakan tentang dokumen hukum...",
                        set_halign: gtk::Align::Start,
                        set_valign: gtk::Align::Start,
                        set_margin_start: 12,
                        set_margin_top: 8,
                        set_can_target: false,
                        add_css_class: "input-placeholder",
                        #[watch]
                        set_visible: !model.has_text,
                    },
                },

                #[name = "send_button"]
                gtk::Button {
                    set_icon_name: "go-up-symbolic",
                    set_tooltip_text: Some("Kirim (Enter)"),
                    set_valign: gtk::Align::End,
                    add_css_class: "suggested-action",
                    add_css_class: "circular",
                    #[watch]
                    set_sensitive: !model.sending && model.has_text,
                    connect_clicked => InputAreaMsg::SendClicked,
                },
            },

            gtk::Label {
                set_label: "AI dapat membuat kesalahan. Periksa informasi penting.",
                set_halign: gtk::Align::Center,
                set_margin_bottom: 6,
                add_css_class: "dim-label",
                add_css_class: "caption",
            },
        }
    }

    fn init(
        _init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let buffer = gtk::TextBuffer::new(None::<&gtk::TextTagTable>);

        let model = Self {
            buffer: buffer.clone(),
            sending: false,
            has_text: false,
        };

        let widgets = view_output!();

        // Enter sends, Shift+Enter inserts a newline
        let sender_key = sender.clone();
        let key_controller = gtk::EventControllerKey::new();
        key_controller.connect_key_pressed(move |_, key, _code, modifier| {
            let is_enter = key == gtk::gdk::Key::Return || key == gtk::gdk::Key::KP_Enter;
            if is_enter && !modifier.contains(gtk::gdk::ModifierType::SHIFT_MASK) {
                sender_key.input(InputAreaMsg::SendClicked);
                gtk::glib::Propagation::Stop
            } else {
                gtk::glib::Propagation::Proceed
            }
        });
        widgets.text_view.add_controller(key_controller);

        let sender_buf = sender.clone();
        buffer.connect_changed(move |_| {
            sender_buf.input(InputAreaMsg::TextChanged);
        });

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, sender: ComponentSender<Self>, _root: &Self::Root) {
        match msg {
            InputAreaMsg::SendClicked => {
                // The text stays put until the owner accepts it and sends Clear.
                if !self.sending && self.has_text {
                    let _ = sender.output(InputAreaOutput::SendMessage(self.get_text()));
                }
            }
            InputAreaMsg::SetSending(sending) => {
                self.sending = sending;
            }
            InputAreaMsg::Clear => {
                self.buffer.set_text("");
            }
            InputAreaMsg::TextChanged => {
                self.has_text = !self.get_text().trim().is_empty();
            }
        }
    }
}

impl InputArea {
    fn get_text(&self) -> String {
        let start = self.buffer.start_iter();
        let end = self.buffer.end_iter();
        self.buffer.text(&start, &end, false).to_string()
    }
}
